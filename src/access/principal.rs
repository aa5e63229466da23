//! Principal identifiers: `type:id` composites naming who gets access.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of principal access is granted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrincipalType {
    #[default]
    ServiceAccount,
    Group,
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceAccount => write!(f, "serviceAccount"),
            Self::Group => write!(f, "group"),
        }
    }
}

impl FromStr for PrincipalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serviceAccount" => Ok(Self::ServiceAccount),
            "group" => Ok(Self::Group),
            other => Err(format!("unknown principal type: {other}")),
        }
    }
}

/// A principal such as `serviceAccount:etl@project.iam.example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalId {
    pub kind: PrincipalType,
    pub id: String,
}

impl PrincipalId {
    pub fn new(kind: PrincipalType, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Platform principal URN, e.g.
    /// `urn:li:dataPlatformPrincipal:(urn:li:dataPlatform:bigquery,group:x@y.com)`.
    pub fn urn(&self, platform: &str) -> String {
        format!("urn:li:dataPlatformPrincipal:(urn:li:dataPlatform:{platform},{self})")
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for PrincipalId {
    type Err = String;

    /// A value without a type prefix is taken as a service account id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((kind, id)) => Ok(Self::new(kind.parse()?, id)),
            None => Ok(Self::new(PrincipalType::ServiceAccount, s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_identifiers() {
        let principal: PrincipalId = "group:analysts@example.com".parse().unwrap();
        assert_eq!(principal.kind, PrincipalType::Group);
        assert_eq!(principal.id, "analysts@example.com");
        assert_eq!(principal.to_string(), "group:analysts@example.com");
    }

    #[test]
    fn untyped_value_defaults_to_service_account() {
        let principal: PrincipalId = "etl@example.com".parse().unwrap();
        assert_eq!(principal.kind, PrincipalType::ServiceAccount);
        assert_eq!(principal.to_string(), "serviceAccount:etl@example.com");
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!("robot:r2@example.com".parse::<PrincipalId>().is_err());
    }

    #[test]
    fn urn_wraps_platform_and_principal() {
        let principal = PrincipalId::new(PrincipalType::ServiceAccount, "etl@example.com");
        assert_eq!(
            principal.urn("bigquery"),
            "urn:li:dataPlatformPrincipal:(urn:li:dataPlatform:bigquery,serviceAccount:etl@example.com)"
        );
    }

    #[test]
    fn type_display_matches_serde() {
        for kind in [PrincipalType::ServiceAccount, PrincipalType::Group] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
