use crate::{
    error::Error,
    gtfs::parser::Row,
    shared::{geo::Coordinate, time::ServiceTime},
};

/// Typed GTFS row records. Each `from_row` enforces required-field presence
/// and numeric convertibility; a failure names the field and source line.

#[derive(Debug, Clone)]
pub struct GtfsAgency {
    pub agency_id: String,
    pub name: String,
    pub url: Option<String>,
    pub timezone: Option<String>,
    pub lang: Option<String>,
    pub phone: Option<String>,
}

impl GtfsAgency {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            agency_id: row.require("agency_id")?.to_string(),
            name: row.require("agency_name")?.to_string(),
            url: row.get("agency_url").map(String::from),
            timezone: row.get("agency_timezone").map(String::from),
            lang: row.get("agency_lang").map(String::from),
            phone: row.get("agency_phone").map(String::from),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsRoute {
    pub route_id: String,
    pub agency_id: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub description: Option<String>,
    /// GTFS transport-mode code: 0=tram, 1=subway, 2=rail, 3=bus, ...
    pub route_type: i64,
    pub color: Option<String>,
    pub text_color: Option<String>,
}

impl GtfsRoute {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            route_id: row.require("route_id")?.to_string(),
            agency_id: row.require("agency_id")?.to_string(),
            short_name: row.get("route_short_name").map(String::from),
            long_name: row.get("route_long_name").map(String::from),
            description: row.get("route_desc").map(String::from),
            route_type: row.require_parse("route_type")?,
            color: row.get("route_color").map(String::from),
            text_color: row.get("route_text_color").map(String::from),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsStop {
    pub stop_id: String,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub coordinate: Coordinate,
    /// 0=platform/stop, 1=station.
    pub location_type: i64,
    pub parent_station: Option<String>,
}

impl GtfsStop {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        let latitude: f64 = row.require_parse("stop_lat")?;
        let longitude: f64 = row.require_parse("stop_lon")?;
        let coordinate = Coordinate::new(latitude, longitude);
        if !coordinate.latitude_is_valid() {
            return Err(row.invalid("stop_lat", &latitude.to_string()));
        }
        if !coordinate.longitude_is_valid() {
            return Err(row.invalid("stop_lon", &longitude.to_string()));
        }
        Ok(Self {
            stop_id: row.require("stop_id")?.to_string(),
            name: row.require("stop_name")?.to_string(),
            code: row.get("stop_code").map(String::from),
            description: row.get("stop_desc").map(String::from),
            coordinate,
            location_type: row.parse("location_type")?.unwrap_or(0),
            parent_station: row.get("parent_station").map(String::from),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsTrip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: Option<String>,
    pub direction_id: Option<i64>,
    pub shape_id: Option<String>,
}

impl GtfsTrip {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            trip_id: row.require("trip_id")?.to_string(),
            route_id: row.require("route_id")?.to_string(),
            service_id: row.require("service_id")?.to_string(),
            headsign: row.get("trip_headsign").map(String::from),
            direction_id: row.parse("direction_id")?,
            shape_id: row.get("shape_id").map(String::from),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsStopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: i64,
    /// Stored zero-padded so lexical ordering matches service-day order,
    /// including hours past 23.
    pub arrival_time: String,
    pub departure_time: String,
}

impl GtfsStopTime {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        let arrival = row.require("arrival_time")?;
        let arrival_time = ServiceTime::from_hms(arrival)
            .ok_or_else(|| row.invalid("arrival_time", arrival))?
            .to_hms_string();
        let departure = row.require("departure_time")?;
        let departure_time = ServiceTime::from_hms(departure)
            .ok_or_else(|| row.invalid("departure_time", departure))?
            .to_hms_string();
        Ok(Self {
            trip_id: row.require("trip_id")?.to_string(),
            stop_id: row.require("stop_id")?.to_string(),
            stop_sequence: row.require_parse("stop_sequence")?,
            arrival_time,
            departure_time,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsCalendar {
    pub service_id: String,
    pub weekdays: [bool; 7],
    pub start_date: String,
    pub end_date: String,
}

impl GtfsCalendar {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        const DAYS: [&str; 7] = [
            "monday",
            "tuesday",
            "wednesday",
            "thursday",
            "friday",
            "saturday",
            "sunday",
        ];
        let mut weekdays = [false; 7];
        for (flag, day) in weekdays.iter_mut().zip(DAYS) {
            *flag = match row.require(day)? {
                "0" => false,
                "1" => true,
                other => return Err(row.invalid(day, other)),
            };
        }
        Ok(Self {
            service_id: row.require("service_id")?.to_string(),
            weekdays,
            start_date: row.require("start_date")?.to_string(),
            end_date: row.require("end_date")?.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsCalendarDate {
    pub service_id: String,
    pub date: String,
    /// 1 = service added on this date, 2 = removed.
    pub exception_type: i64,
}

impl GtfsCalendarDate {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        let exception_type: i64 = row.require_parse("exception_type")?;
        if !(1..=2).contains(&exception_type) {
            return Err(row.invalid("exception_type", &exception_type.to_string()));
        }
        Ok(Self {
            service_id: row.require("service_id")?.to_string(),
            date: row.require("date")?.to_string(),
            exception_type,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsShapePoint {
    pub shape_id: String,
    pub sequence: i64,
    pub coordinate: Coordinate,
}

impl GtfsShapePoint {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        let latitude: f64 = row.require_parse("shape_pt_lat")?;
        let longitude: f64 = row.require_parse("shape_pt_lon")?;
        let coordinate = Coordinate::new(latitude, longitude);
        if !coordinate.latitude_is_valid() {
            return Err(row.invalid("shape_pt_lat", &latitude.to_string()));
        }
        if !coordinate.longitude_is_valid() {
            return Err(row.invalid("shape_pt_lon", &longitude.to_string()));
        }
        Ok(Self {
            shape_id: row.require("shape_id")?.to_string(),
            sequence: row.require_parse("shape_pt_sequence")?,
            coordinate,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsFareAttribute {
    pub fare_id: String,
    pub price: f64,
    pub currency: String,
    pub payment_method: Option<i64>,
    pub transfers: Option<i64>,
}

impl GtfsFareAttribute {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            fare_id: row.require("fare_id")?.to_string(),
            price: row.require_parse("price")?,
            currency: row.require("currency_type")?.to_string(),
            payment_method: row.parse("payment_method")?,
            transfers: row.parse("transfers")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsFareRule {
    pub fare_id: String,
    pub route_id: Option<String>,
    pub origin_id: Option<String>,
    pub destination_id: Option<String>,
}

impl GtfsFareRule {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            fare_id: row.require("fare_id")?.to_string(),
            route_id: row.get("route_id").map(String::from),
            origin_id: row.get("origin_id").map(String::from),
            destination_id: row.get("destination_id").map(String::from),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GtfsFeedInfo {
    pub publisher_name: String,
    pub publisher_url: Option<String>,
    pub lang: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub version: Option<String>,
}

impl GtfsFeedInfo {
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Self {
            publisher_name: row.require("feed_publisher_name")?.to_string(),
            publisher_url: row.get("feed_publisher_url").map(String::from),
            lang: row.get("feed_lang").map(String::from),
            start_date: row.get("feed_start_date").map(String::from),
            end_date: row.get("feed_end_date").map(String::from),
            version: row.get("feed_version").map(String::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::{parser::TableReader, schema};

    fn single_row(body: &str, schema: schema::TableSchema) -> Row {
        TableReader::new(body.as_bytes().to_vec(), schema)
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
    }

    #[test]
    fn stop_roundtrip_test() {
        let row = single_row(
            "stop_id,stop_name,stop_lat,stop_lon,location_type\nS1,Central,59.331,18.062,1\n",
            schema::STOPS,
        );
        let stop = GtfsStop::from_row(&row).unwrap();
        assert_eq!(stop.stop_id, "S1");
        assert_eq!(stop.coordinate.latitude, 59.331);
        assert_eq!(stop.coordinate.longitude, 18.062);
        assert_eq!(stop.location_type, 1);
    }

    #[test]
    fn stop_missing_latitude_test() {
        let row = single_row(
            "stop_id,stop_name,stop_lat,stop_lon\nS1,Central,,18.062\n",
            schema::STOPS,
        );
        assert!(matches!(
            GtfsStop::from_row(&row),
            Err(Error::InvalidFieldValue { field: "stop_lat", .. })
        ));
    }

    #[test]
    fn stop_out_of_range_latitude_test() {
        let row = single_row(
            "stop_id,stop_name,stop_lat,stop_lon\nS1,Central,95.0,18.062\n",
            schema::STOPS,
        );
        assert!(matches!(
            GtfsStop::from_row(&row),
            Err(Error::InvalidFieldValue { field: "stop_lat", .. })
        ));
    }

    #[test]
    fn stop_out_of_range_longitude_blames_longitude_test() {
        let row = single_row(
            "stop_id,stop_name,stop_lat,stop_lon\nS1,Central,59.331,-190.0\n",
            schema::STOPS,
        );
        assert!(matches!(
            GtfsStop::from_row(&row),
            Err(Error::InvalidFieldValue { field: "stop_lon", .. })
        ));
    }

    #[test]
    fn stop_time_normalizes_padding_test() {
        let row = single_row(
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,8:00:00,25:10:00,S1,1\n",
            schema::STOP_TIMES,
        );
        let stop_time = GtfsStopTime::from_row(&row).unwrap();
        assert_eq!(stop_time.arrival_time, "08:00:00");
        assert_eq!(stop_time.departure_time, "25:10:00");
    }

    #[test]
    fn calendar_day_flags_test() {
        let row = single_row(
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             WKDY,1,1,1,1,1,0,0,20260101,20261231\n",
            schema::CALENDAR,
        );
        let calendar = GtfsCalendar::from_row(&row).unwrap();
        assert_eq!(
            calendar.weekdays,
            [true, true, true, true, true, false, false]
        );
    }

    #[test]
    fn calendar_date_exception_range_test() {
        let row = single_row(
            "service_id,date,exception_type\nWKDY,20260704,3\n",
            schema::CALENDAR_DATES,
        );
        assert!(GtfsCalendarDate::from_row(&row).is_err());
    }
}
