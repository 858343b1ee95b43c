//! Wire format of the permission check against the parent application.

use serde::{Deserialize, Serialize};

pub const DEFAULT_REQUESTER: &str = "commento";
pub const PERM_CAN_COMMENT: &str = "canComment";
pub const PERMISSION_CHECK_PATH: &str = "/api/v1/permissions/check";

/// The signed part of a permission check. Field order is the canonical
/// serialization order and must not change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PermissionPayload {
    pub requester: String,
    pub email: String,
    pub route: String,
    #[serde(rename = "permKey")]
    pub perm_key: String,
}

impl PermissionPayload {
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn into_form(self, hmac: String) -> PermissionForm {
        PermissionForm {
            requester: self.requester,
            email: self.email,
            route: self.route,
            perm_key: self.perm_key,
            hmac,
        }
    }
}

/// Form body actually posted: the payload fields plus the hex HMAC.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PermissionForm {
    pub requester: String,
    pub email: String,
    pub route: String,
    #[serde(rename = "permKey")]
    pub perm_key: String,
    pub hmac: String,
}

impl PermissionForm {
    pub fn payload(&self) -> PermissionPayload {
        PermissionPayload {
            requester: self.requester.clone(),
            email: self.email.clone(),
            route: self.route.clone(),
            perm_key: self.perm_key.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PermissionVerdict {
    pub result: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_keep_field_order() {
        let payload = PermissionPayload {
            requester: DEFAULT_REQUESTER.into(),
            email: "ferris@example.org".into(),
            route: "/blog/hello".into(),
            perm_key: PERM_CAN_COMMENT.into(),
        };
        let bytes = payload.canonical_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"requester":"commento","email":"ferris@example.org","route":"/blog/hello","permKey":"canComment"}"#
        );
    }

    #[test]
    fn verdict_error_is_optional() {
        let v: PermissionVerdict = serde_json::from_str(r#"{"result":true}"#).unwrap();
        assert!(v.result);
        assert_eq!(v.error, None);

        let v: PermissionVerdict =
            serde_json::from_str(r#"{"result":false,"error":"no such user"}"#).unwrap();
        assert!(!v.result);
        assert_eq!(v.error.as_deref(), Some("no such user"));
    }
}
