//! Composite payment references.
//!
//! The user-payments endpoint identifies a payment by one string that joins
//! the service identification, case reference, site id and fee code with
//! `$$$`. Consuming services split on that delimiter, so field order and the
//! delimiter itself are fixed.

use std::fmt;
use std::str::FromStr;

use crate::error::PayError;

pub const REFERENCE_DELIMITER: &str = "$$$";

/// A payment reference built client-side from its four parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeReference {
    pub service_identification: String,
    pub case_reference: String,
    pub site_id: String,
    pub fee_code: String,
}

impl CompositeReference {
    pub fn new(
        service_identification: impl Into<String>,
        case_reference: impl Into<String>,
        site_id: impl Into<String>,
        fee_code: impl Into<String>,
    ) -> Self {
        Self {
            service_identification: service_identification.into(),
            case_reference: case_reference.into(),
            site_id: site_id.into(),
            fee_code: fee_code.into(),
        }
    }
}

impl CompositeReference {
    /// Every field must be non-empty and free of the delimiter, otherwise
    /// the joined string would not split back into the same four fields.
    pub fn validate(&self) -> Result<(), PayError> {
        let fields = [
            &self.service_identification,
            &self.case_reference,
            &self.site_id,
            &self.fee_code,
        ];
        if fields
            .iter()
            .any(|f| f.is_empty() || f.contains(REFERENCE_DELIMITER))
        {
            return Err(PayError::InvalidReference(self.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for CompositeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = REFERENCE_DELIMITER;
        write!(
            f,
            "{}{d}{}{d}{}{d}{}",
            self.service_identification, self.case_reference, self.site_id, self.fee_code
        )
    }
}

impl FromStr for CompositeReference {
    type Err = PayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(REFERENCE_DELIMITER).collect();
        match parts.as_slice() {
            [service, case, site, fee] if parts.iter().all(|p| !p.is_empty()) => {
                Ok(Self::new(*service, *case, *site, *fee))
            }
            _ => Err(PayError::InvalidReference(s.to_string())),
        }
    }
}
