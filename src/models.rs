//! Domain models shared by the store, the synchronizer, and the TUI. These
//! stay plain data holders; persistence and presentation logic live elsewhere.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named counter. Mirrors one row of the `items` table.
pub struct Item {
    /// Primary key assigned by SQLite on insert. Never changes afterwards.
    pub id: i64,
    /// Text chosen at creation time. There is no edit path, so this is fixed
    /// for the lifetime of the row.
    pub label: String,
    /// Number of confirmed increments. Starts at zero and only goes up.
    pub count: i64,
}

impl Item {
    /// Build the in-memory twin of a row the store has just inserted.
    pub fn fresh(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            count: 0,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({})", self.id, self.label, self.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// A position as reported by the location provider.
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Reverse-geocoded address. Every part is optional because geocoders often
/// return partial records (open water, rural roads, and so on).
pub struct Address {
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub city: Option<String>,
    pub iso_country_code: Option<String>,
}

impl Address {
    /// City name, if the geocoder produced a non-blank one. This is the only
    /// field the rest of the application relies on (as a default item label).
    pub fn city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }
}

impl fmt::Display for Address {
    /// `street street_number city iso` with missing parts skipped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            &self.street,
            &self.street_number,
            &self.city,
            &self.iso_country_code,
        ];
        let mut first = true;
        for part in parts.into_iter().flatten() {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(part)?;
            first = false;
        }
        Ok(())
    }
}
