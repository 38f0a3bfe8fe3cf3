//! Request classification and field extraction.
//!
//! A framed object is either a query (`{"get":[...]}`) or a configure
//! (`{"set":{...}}`). Parsing is field-level, not structural: the marker
//! key is located, its bracketed span is bounded by the first matching
//! close bracket, and recognized field names are matched by containment
//! within that span. This reproduces the behavior existing hosts were
//! built against; see [`FieldSet`] for the known false-positive it implies.

/// Marker key identifying a query request
pub const QUERY_MARKER: &str = "\"get\"";

/// Marker key identifying a configure request
pub const CONFIGURE_MARKER: &str = "\"set\"";

/// Fields a query may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueryField {
    /// Bus voltage in volts (`v`)
    BusVoltage = 0,
    /// Current in amperes (`a`)
    Current = 1,
    /// Power in watts (`w`)
    Power = 2,
    /// Charge percentage derived from the configured thresholds (`pct`)
    ChargePct = 3,
    /// Charging-direction heuristic (`charging`)
    Charging = 4,
    /// Configured minimum threshold voltage (`min_v`)
    MinVolts = 5,
    /// Configured maximum threshold voltage (`max_v`)
    MaxVolts = 6,
    /// Configured battery capacity in hours (`hrs_capacity`)
    CapacityHours = 7,
    /// Estimated hours remaining at the configured capacity (`hrs_remaining`)
    HoursRemaining = 8,
    /// Firmware version tag (`fw`)
    FirmwareTag = 9,
}

impl QueryField {
    /// Every recognized query field, in reply emission order
    pub const ALL: [QueryField; 10] = [
        QueryField::BusVoltage,
        QueryField::Current,
        QueryField::Power,
        QueryField::ChargePct,
        QueryField::Charging,
        QueryField::MinVolts,
        QueryField::MaxVolts,
        QueryField::CapacityHours,
        QueryField::HoursRemaining,
        QueryField::FirmwareTag,
    ];

    /// Wire name of the field
    pub fn key(self) -> &'static str {
        match self {
            QueryField::BusVoltage => "v",
            QueryField::Current => "a",
            QueryField::Power => "w",
            QueryField::ChargePct => "pct",
            QueryField::Charging => "charging",
            QueryField::MinVolts => "min_v",
            QueryField::MaxVolts => "max_v",
            QueryField::CapacityHours => "hrs_capacity",
            QueryField::HoursRemaining => "hrs_remaining",
            QueryField::FirmwareTag => "fw",
        }
    }

    /// The field name as it appears quoted in the request text
    fn quoted(self) -> &'static str {
        match self {
            QueryField::BusVoltage => "\"v\"",
            QueryField::Current => "\"a\"",
            QueryField::Power => "\"w\"",
            QueryField::ChargePct => "\"pct\"",
            QueryField::Charging => "\"charging\"",
            QueryField::MinVolts => "\"min_v\"",
            QueryField::MaxVolts => "\"max_v\"",
            QueryField::CapacityHours => "\"hrs_capacity\"",
            QueryField::HoursRemaining => "\"hrs_remaining\"",
            QueryField::FirmwareTag => "\"fw\"",
        }
    }
}

/// Set of requested query fields
///
/// A field is considered requested if its exact quoted name occurs anywhere
/// between the `[` and `]` of the get-array, whether or not it is a list
/// element of its own. That containment test can over-report - raw text
/// like `{"get":["note about "pct" here"]}` registers `pct` - and is kept
/// as-is because deployed hosts only ever place field names there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldSet(u16);

impl FieldSet {
    /// Set with no fields requested
    pub const EMPTY: FieldSet = FieldSet(0);

    /// Add a field to the set
    pub fn insert(&mut self, field: QueryField) {
        self.0 |= 1 << (field as u16);
    }

    /// Whether the field was requested
    pub fn contains(&self, field: QueryField) -> bool {
        self.0 & (1 << (field as u16)) != 0
    }

    /// True if nothing was requested
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// New values supplied by a configure request
///
/// All fields are optional; a configure that names none of them is still
/// answered (with the current values) but changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigUpdate {
    /// New minimum threshold voltage
    pub min_v: Option<f32>,
    /// New maximum threshold voltage
    pub max_v: Option<f32>,
    /// New battery capacity in hours
    pub capacity_hours: Option<f32>,
}

impl ConfigUpdate {
    /// True if the request supplied no recognized value
    pub fn is_empty(&self) -> bool {
        self.min_v.is_none() && self.max_v.is_none() && self.capacity_hours.is_none()
    }
}

/// A well-formed request
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// `{"get":[...]}` - read the named fields
    Query(FieldSet),
    /// `{"set":{...}}` - update thresholds/capacity
    Configure(ConfigUpdate),
}

/// Why a framed object was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
    /// Both marker keys present - ambiguous, refused outright
    BothGetAndSet,
    /// Neither marker present, or the marker's span is structurally broken
    BadRequest,
}

impl RequestError {
    /// Wire error code for the reply
    pub fn code(self) -> &'static str {
        match self {
            RequestError::BothGetAndSet => "both_get_and_set",
            RequestError::BadRequest => "bad_request",
        }
    }
}

/// Classify a framed object and extract its fields
pub fn parse(text: &str) -> Result<Request, RequestError> {
    let has_query = text.contains(QUERY_MARKER);
    let has_configure = text.contains(CONFIGURE_MARKER);

    if has_query && has_configure {
        return Err(RequestError::BothGetAndSet);
    }

    if has_configure {
        if let Some(update) = parse_configure(text) {
            return Ok(Request::Configure(update));
        }
    }

    if has_query {
        if let Some(fields) = parse_query(text) {
            return Ok(Request::Query(fields));
        }
    }

    Err(RequestError::BadRequest)
}

/// Extract the requested field set from a query
///
/// The span runs from the first `[` after the marker to the first `]`
/// after that. A field registers when its quoted name starts inside the
/// span.
fn parse_query(text: &str) -> Option<FieldSet> {
    let marker = text.find(QUERY_MARKER)?;
    let after = &text[marker + QUERY_MARKER.len()..];
    let open = after.find('[')?;
    let span = &after[open..];
    let close = span.find(']')?;

    let mut fields = FieldSet::EMPTY;
    for field in QueryField::ALL {
        if let Some(at) = span.find(field.quoted()) {
            if at < close {
                fields.insert(field);
            }
        }
    }
    Some(fields)
}

/// Extract new values from a configure
///
/// The span runs from the first `{` after the marker to the first `}`
/// after that. Each recognized key found in the span takes the first
/// numeric token following it as its value.
fn parse_configure(text: &str) -> Option<ConfigUpdate> {
    let marker = text.find(CONFIGURE_MARKER)?;
    let after = &text[marker + CONFIGURE_MARKER.len()..];
    let open = after.find('{')?;
    let span = &after[open..];
    let close = span.find('}')?;

    Some(ConfigUpdate {
        min_v: configure_value(span, close, "\"min_v\""),
        max_v: configure_value(span, close, "\"max_v\""),
        capacity_hours: configure_value(span, close, "\"hrs_capacity\""),
    })
}

fn configure_value(span: &str, close: usize, key: &str) -> Option<f32> {
    let at = span.find(key)?;
    if at >= close {
        return None;
    }
    scan_number(&span[at + key.len()..])
}

/// Parse the first numeric token: optional sign, digits, optional decimal
/// point, more digits. Returns `None` if no digit is found before the span
/// runs out or the token does not parse.
fn scan_number(text: &str) -> Option<f32> {
    let start = text.find(|c: char| c.is_ascii_digit() || c == '-' || c == '.')?;
    let bytes = &text.as_bytes()[start..];

    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    if bytes[end] == b'-' {
        end += 1;
    }
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return None;
    }
    text[start..start + end].parse::<f32>().ok()
}
