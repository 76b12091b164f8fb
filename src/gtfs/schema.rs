/// One recognized column of a GTFS table. Required columns must appear in
/// the header; optional ones may be absent entirely.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub required: bool,
}

const fn req(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        required: true,
    }
}

const fn opt(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        required: false,
    }
}

/// Expected shape of one GTFS table. The header row of the actual file
/// decides column order; unknown columns are ignored.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub file: &'static str,
    pub columns: &'static [ColumnSpec],
}

pub const AGENCY: TableSchema = TableSchema {
    file: "agency.txt",
    columns: &[
        req("agency_id"),
        req("agency_name"),
        opt("agency_url"),
        opt("agency_timezone"),
        opt("agency_lang"),
        opt("agency_phone"),
    ],
};

pub const ROUTES: TableSchema = TableSchema {
    file: "routes.txt",
    columns: &[
        req("route_id"),
        req("agency_id"),
        opt("route_short_name"),
        opt("route_long_name"),
        opt("route_desc"),
        req("route_type"),
        opt("route_color"),
        opt("route_text_color"),
    ],
};

pub const STOPS: TableSchema = TableSchema {
    file: "stops.txt",
    columns: &[
        req("stop_id"),
        req("stop_name"),
        opt("stop_code"),
        opt("stop_desc"),
        req("stop_lat"),
        req("stop_lon"),
        opt("location_type"),
        opt("parent_station"),
    ],
};

pub const TRIPS: TableSchema = TableSchema {
    file: "trips.txt",
    columns: &[
        req("trip_id"),
        req("route_id"),
        req("service_id"),
        opt("trip_headsign"),
        opt("direction_id"),
        opt("shape_id"),
    ],
};

pub const STOP_TIMES: TableSchema = TableSchema {
    file: "stop_times.txt",
    columns: &[
        req("trip_id"),
        req("arrival_time"),
        req("departure_time"),
        req("stop_id"),
        req("stop_sequence"),
    ],
};

pub const CALENDAR: TableSchema = TableSchema {
    file: "calendar.txt",
    columns: &[
        req("service_id"),
        req("monday"),
        req("tuesday"),
        req("wednesday"),
        req("thursday"),
        req("friday"),
        req("saturday"),
        req("sunday"),
        req("start_date"),
        req("end_date"),
    ],
};

pub const CALENDAR_DATES: TableSchema = TableSchema {
    file: "calendar_dates.txt",
    columns: &[req("service_id"), req("date"), req("exception_type")],
};

pub const SHAPES: TableSchema = TableSchema {
    file: "shapes.txt",
    columns: &[
        req("shape_id"),
        req("shape_pt_lat"),
        req("shape_pt_lon"),
        req("shape_pt_sequence"),
    ],
};

pub const FARE_ATTRIBUTES: TableSchema = TableSchema {
    file: "fare_attributes.txt",
    columns: &[
        req("fare_id"),
        req("price"),
        req("currency_type"),
        opt("payment_method"),
        opt("transfers"),
    ],
};

pub const FARE_RULES: TableSchema = TableSchema {
    file: "fare_rules.txt",
    columns: &[
        req("fare_id"),
        opt("route_id"),
        opt("origin_id"),
        opt("destination_id"),
    ],
};

pub const FEED_INFO: TableSchema = TableSchema {
    file: "feed_info.txt",
    columns: &[
        req("feed_publisher_name"),
        opt("feed_publisher_url"),
        opt("feed_lang"),
        opt("feed_start_date"),
        opt("feed_end_date"),
        opt("feed_version"),
    ],
};
