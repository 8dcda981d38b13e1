use serde::{Deserialize, Serialize};
use std::fmt;

/// A positioned word as emitted by the document source.
///
/// `top` and `left` are in page units, origin at the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub top: f32,
    pub left: f32,
}

impl Token {
    pub fn new(text: impl Into<String>, top: f32, left: f32) -> Self {
        Token {
            text: text.into(),
            top,
            left,
        }
    }
}

/// One logical text row of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    /// Top of the token that started the row.
    pub top: f32,
}

/// A person's booking entry reconstructed from a report page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Name as printed, e.g. "SMITH, JOHN A".
    pub name: String,
    /// "MM/DD/YYYY HH:MM:SS AM|PM"
    pub booked_at: String,
    /// "MM/DD/YYYY"
    pub date_of_birth: String,
    pub gender: String,
    /// Arresting agency or officer.
    pub brought_by: String,
    /// Charge lines in document order.
    #[serde(default)]
    pub charges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameParts {
    pub first: String,
    pub middle: String,
    pub last: String,
}

impl BookingRecord {
    /// Split the printed name into first, middle and last components.
    ///
    /// Commas are dropped. A single word is the first name; with two words the
    /// second is the last name; anything in between becomes the middle name.
    pub fn name_parts(&self) -> NameParts {
        let cleaned = self.name.replace(',', "");
        let words: Vec<&str> = cleaned.split_whitespace().collect();

        match words.as_slice() {
            [] => NameParts::default(),
            [first] => NameParts {
                first: first.to_string(),
                ..Default::default()
            },
            [first, last] => NameParts {
                first: first.to_string(),
                middle: String::new(),
                last: last.to_string(),
            },
            [first, middle @ .., last] => NameParts {
                first: first.to_string(),
                middle: middle.join(" "),
                last: last.to_string(),
            },
        }
    }

    /// Charges joined with "; ", or "None" when the record has none.
    pub fn charges_summary(&self) -> String {
        if self.charges.is_empty() {
            "None".to_string()
        } else {
            self.charges.join("; ")
        }
    }

    /// Multi-line body used when announcing a record.
    pub fn describe(&self) -> String {
        let charges = if self.charges.is_empty() {
            "None".to_string()
        } else {
            self.charges.join("\n")
        };
        format!(
            "Booking: {}\nDOB: {}\nGender: {}\nArrestor: {}\nCharges:\n{}",
            self.booked_at, self.date_of_birth, self.gender, self.brought_by, charges
        )
    }
}

impl fmt::Display for BookingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (booked {}, DOB {}, {})",
            self.name, self.booked_at, self.date_of_birth, self.gender
        )
    }
}

/// An image fragment found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRegion {
    pub bytes: Vec<u8>,
    /// Vertical midpoint in page units, when the source knows where the image sits.
    pub midpoint: Option<f32>,
}

impl ImageRegion {
    pub fn positioned(bytes: Vec<u8>, midpoint: f32) -> Self {
        ImageRegion {
            bytes,
            midpoint: Some(midpoint),
        }
    }

    pub fn unpositioned(bytes: Vec<u8>) -> Self {
        ImageRegion {
            bytes,
            midpoint: None,
        }
    }
}

/// A booking record together with the mugshot assigned to it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordImagePair {
    /// 1-based page the record was found on.
    pub page_number: usize,
    pub record: BookingRecord,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
}

impl RecordImagePair {
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}
