//! Resolution of source-specific column names to logical fields.

use crate::ingest::record::RawRow;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Header names that look like a date column.
static DATE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(event|observ(ed|ation)?|collect(ed|ion)?|time).*date|^date$")
        .expect("valid regex")
});

/// Logical fields read from occurrence rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Species,
    Id,
    Latitude,
    Longitude,
    Date,
    Year,
    Month,
    Day,
    Country,
    Source,
    Media,
    Uncertainty,
    EstablishmentMeans,
    BasisOfRecord,
    Issues,
    Remarks,
    Locality,
    Habitat,
}

impl Field {
    pub const ALL: [Field; 18] = [
        Field::Species,
        Field::Id,
        Field::Latitude,
        Field::Longitude,
        Field::Date,
        Field::Year,
        Field::Month,
        Field::Day,
        Field::Country,
        Field::Source,
        Field::Media,
        Field::Uncertainty,
        Field::EstablishmentMeans,
        Field::BasisOfRecord,
        Field::Issues,
        Field::Remarks,
        Field::Locality,
        Field::Habitat,
    ];

    /// Candidate column names, most preferred first.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Field::Species => &[
                "final_species",
                "taxonomy_updated_species",
                "scientific_name",
                "scientificName",
                "species",
            ],
            Field::Id => &["id", "gbifID", "occurrenceID", "catalogNumber"],
            Field::Latitude => &["decimalLatitude", "latitude", "lat"],
            Field::Longitude => &["decimalLongitude", "longitude", "lon", "lng"],
            Field::Date => &[
                "eventDate",
                "date",
                "observed_on",
                "ObservationDate",
                "dateObserved",
                "date_observed",
                "date_collected",
                "collectionDate",
                "verbatim_date",
                "time_observed_at",
            ],
            Field::Year => &["year"],
            Field::Month => &["month"],
            Field::Day => &["day"],
            Field::Country => &["countryCode", "country"],
            Field::Source => &["source", "datasetName", "Dataset", "institutionCode"],
            Field::Media => &["mediaType", "associatedMedia", "media", "has_photo", "photo"],
            Field::Uncertainty => &[
                "coordinateUncertaintyInMeters",
                "accuracy_m",
                "uncertainty",
                "positional_accuracy",
            ],
            Field::EstablishmentMeans => &["establishmentMeans", "establishment_means"],
            Field::BasisOfRecord => &["basisOfRecord", "basis_of_record"],
            Field::Issues => &["issues", "issue"],
            Field::Remarks => &["occurrenceRemarks", "remarks"],
            Field::Locality => &["locality"],
            Field::Habitat => &["habitat"],
        }
    }
}

/// Column chosen for each logical field, decided once from the first row.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: Vec<(Field, String)>,
    date_columns: Vec<String>,
}

impl ColumnMap {
    /// Picks, per field, the first candidate present in `first_row`.
    ///
    /// An exact name match wins over a case-insensitive one. Fields with no
    /// matching column stay unresolved and read as absent on every row.
    pub fn resolve(first_row: &RawRow) -> Self {
        let columns: Vec<(Field, String)> = Field::ALL
            .iter()
            .filter_map(|&field| Self::pick(first_row, field).map(|name| (field, name)))
            .collect();

        let mut date_columns: Vec<String> = Vec::new();
        let resolved = columns
            .iter()
            .find(|(f, _)| *f == Field::Date)
            .map(|(_, name)| name.clone());
        let known = Field::Date
            .candidates()
            .iter()
            .filter(|c| first_row.contains_key(**c))
            .map(|c| (*c).to_string());
        let by_header = first_row.keys().filter(|k| DATE_HEADER.is_match(k)).cloned();
        for name in resolved.into_iter().chain(known).chain(by_header) {
            if !date_columns.contains(&name) {
                date_columns.push(name);
            }
        }

        Self {
            columns,
            date_columns,
        }
    }

    fn pick(row: &RawRow, field: Field) -> Option<String> {
        for candidate in field.candidates() {
            if row.contains_key(*candidate) {
                return Some((*candidate).to_string());
            }
            if let Some(actual) = row.keys().find(|k| k.eq_ignore_ascii_case(candidate)) {
                return Some(actual.clone());
            }
        }
        None
    }

    pub fn column(&self, field: Field) -> Option<&str> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, name)| name.as_str())
    }

    /// The row's value for `field`, if the field resolved and the row has it.
    pub fn get<'a>(&self, row: &'a RawRow, field: Field) -> Option<&'a Value> {
        self.column(field).and_then(|name| row.get(name))
    }

    pub fn has(&self, field: Field) -> bool {
        self.column(field).is_some()
    }

    /// Every column that may hold a date, best candidate first.
    ///
    /// The resolved [`Field::Date`] column leads, then the other known date
    /// names in priority order, then any other header that looks like a date.
    pub fn date_columns(&self) -> &[String] {
        &self.date_columns
    }
}
