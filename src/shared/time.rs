use std::fmt::Display;

/// A GTFS time of day in seconds from midnight of the service day. Hours
/// past 23 are legal and mean service running past midnight ("25:10:00" is
/// 01:10 on the next calendar day, same service day).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServiceTime(u32);

impl From<u32> for ServiceTime {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for ServiceTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hms_string())
    }
}

impl ServiceTime {
    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    /// Zero-padded `HH:MM:SS`. With every stored time emitted through this,
    /// lexical string comparison and numeric comparison agree, including for
    /// past-midnight values ("25:10:00" sorts after "23:59:00").
    pub fn to_hms_string(&self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }

    /// Hours are capped at 99 so the padded string form has a fixed width;
    /// a third hour digit would sort lexically before "10:00:00".
    pub fn from_hms(time: &str) -> Option<Self> {
        const HOUR_TO_SEC: u32 = 60 * 60;
        const MINUTE_TO_SEC: u32 = 60;
        let mut split = time.trim().split(':');
        let hours: u32 = split.next()?.parse().ok()?;
        let minutes: u32 = split.next()?.parse().ok()?;
        let seconds: u32 = split.next()?.parse().ok()?;
        if split.next().is_some() || hours > 99 || minutes > 59 || seconds > 59 {
            return None;
        }
        Some(Self(hours * HOUR_TO_SEC + minutes * MINUTE_TO_SEC + seconds))
    }
}

#[test]
fn parse_unparse_test() {
    for time in ["00:00:00", "00:00:30", "00:30:00", "12:00:00", "12:30:30"] {
        let stime = ServiceTime::from_hms(time).unwrap();
        assert_eq!(time, stime.to_hms_string())
    }
}

#[test]
fn valid_time_test() {
    assert_eq!(ServiceTime::from_hms("00:00:00").unwrap().as_seconds(), 0);
    assert_eq!(ServiceTime::from_hms("00:00:30").unwrap().as_seconds(), 30);
    assert_eq!(ServiceTime::from_hms("00:01:30").unwrap().as_seconds(), 90);
    assert_eq!(ServiceTime::from_hms("01:01:30").unwrap().as_seconds(), 3690);
}

#[test]
fn past_midnight_test() {
    let late = ServiceTime::from_hms("25:10:00").unwrap();
    assert_eq!(late.as_seconds(), 25 * 3600 + 600);
    assert_eq!(late.to_hms_string(), "25:10:00");
    assert!(late > ServiceTime::from_hms("23:59:00").unwrap());
}

#[test]
fn unpadded_time_test() {
    // Some feeds write "8:00:00"; normalization must re-pad it.
    let time = ServiceTime::from_hms("8:00:00").unwrap();
    assert_eq!(time.to_hms_string(), "08:00:00");
}

#[test]
fn three_digit_hours_rejected_test() {
    // "100:00:00" would sort before "23:50:00" as a string.
    assert!(ServiceTime::from_hms("100:00:00").is_none());
    assert_eq!(
        ServiceTime::from_hms("99:59:59").unwrap().to_hms_string(),
        "99:59:59"
    );
}

#[test]
fn invalid_time_test() {
    assert!(ServiceTime::from_hms("00:00:0a").is_none());
    assert!(ServiceTime::from_hms("00:00").is_none());
    assert!(ServiceTime::from_hms("00:61:00").is_none());
    assert!(ServiceTime::from_hms("00:00:00:00").is_none());
    assert!(ServiceTime::from_hms("").is_none());
}
