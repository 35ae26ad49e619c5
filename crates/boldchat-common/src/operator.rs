//! Operator records as returned by the `getOperators` and `getOperator` calls.

use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::vendor::{lenient_bool, lenient_i64};

/// A chat-support agent account.
///
/// Every field is optional on the wire and falls back to its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operator {
    /// Display name of the operator.
    #[serde(rename = "Name")]
    pub name: String,
    /// Name shown to other operators.
    #[serde(rename = "OperatorName")]
    pub operator_name: String,
    /// Contact email address.
    #[serde(rename = "Email")]
    pub email: String,
    /// Operator ID used by `getOperator` and `editOperator`.
    #[serde(rename = "LoginID")]
    pub login_id: String,
    /// Name shown to visitors in chat.
    #[serde(rename = "ChatName")]
    pub chat_name: String,
    /// Single sign-on name identifier.
    #[serde(rename = "SSONameID")]
    pub sso_name_id: String,
    /// Name used on outgoing email.
    #[serde(rename = "EmailName")]
    pub email_name: String,
    /// Permission group the operator belongs to.
    #[serde(rename = "PermissionGroupID")]
    pub permission_group_id: String,
    /// Whether the account is disabled.
    #[serde(rename = "Disabled", deserialize_with = "lenient_bool")]
    pub disabled: bool,
    /// Departments the operator is assigned to.
    #[serde(rename = "Departments", deserialize_with = "nullable_vec")]
    pub departments: Vec<OperatorDepartment>,
    /// Twitter channel settings.
    #[serde(rename = "TwitterService")]
    pub twitter_service: Option<OperatorService>,
    /// Email channel settings.
    #[serde(rename = "EmailService")]
    pub email_service: Option<OperatorService>,
    /// Chat channel settings.
    #[serde(rename = "ChatService")]
    pub chat_service: Option<OperatorService>,
    /// SMS channel settings.
    #[serde(rename = "SmsService")]
    pub sms_service: Option<OperatorService>,
}

fn nullable_vec<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(d).map(Option::unwrap_or_default)
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "OperatorName: {}", self.operator_name)?;
        writeln!(f, "Email: {}", self.email)?;
        writeln!(f, "LoginID: {}", self.login_id)?;
        writeln!(f, "ChatName: {}", self.chat_name)?;
        writeln!(f, "SSONameID: {}", self.sso_name_id)?;
        writeln!(f, "EmailName: {}", self.email_name)?;
        writeln!(f, "PermissionGroupID: {}", self.permission_group_id)?;
        writeln!(f, "Disabled: {}", self.disabled)?;
        writeln!(f, "Departments:")?;
        for department in &self.departments {
            writeln!(f, "\t{department}")?;
        }
        for (label, service) in [
            ("TwitterService", &self.twitter_service),
            ("EmailService", &self.email_service),
            ("ChatService", &self.chat_service),
            ("SmsService", &self.sms_service),
        ] {
            match service {
                Some(service) => writeln!(f, "{label}: {service}")?,
                None => writeln!(f, "{label}: -")?,
            }
        }
        Ok(())
    }
}

/// Per-channel availability and capacity of an operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorService {
    /// Whether the operator accepts work on this channel.
    #[serde(rename = "Available", deserialize_with = "lenient_bool")]
    pub available: bool,
    /// Maximum concurrent conversations.
    #[serde(rename = "Capacity", deserialize_with = "lenient_i64")]
    pub capacity: i64,
}

impl fmt::Display for OperatorService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "available={} capacity={}", self.available, self.capacity)
    }
}

/// Department assignment of an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct OperatorDepartment {
    /// Routing priority of the operator within the department.
    #[serde(rename = "AssignmentPriority", deserialize_with = "lenient_i64")]
    #[builder(default)]
    pub assignment_priority: i64,
    /// Department priority for the operator.
    #[serde(rename = "Priority", deserialize_with = "lenient_i64")]
    #[builder(default)]
    pub priority: i64,
    /// The department ID.
    #[serde(rename = "DepartmentID")]
    #[builder(setter(into))]
    pub department_id: String,
}

impl fmt::Display for OperatorDepartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "department={} assignment_priority={} priority={}",
            self.department_id, self.assignment_priority, self.priority
        )
    }
}

/// Changes to apply with the `editOperator` call.
///
/// Only `login_id` is required. Fields left as `None` are not sent and keep
/// their current value on the server.
///
/// # Examples
///
/// ```
/// use boldchat_common::OperatorUpdate;
///
/// let update = OperatorUpdate::builder()
///     .login_id("2300000000001")
///     .chat_name("Alex")
///     .build();
/// assert_eq!(update.chat_name.as_deref(), Some("Alex"));
/// assert!(update.email.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct OperatorUpdate {
    /// ID of the operator to edit.
    #[builder(setter(into))]
    pub login_id: String,
    /// Replacement department assignments.
    #[builder(default, setter(strip_option))]
    pub departments: Option<Vec<OperatorDepartment>>,
    /// New operator name.
    #[builder(default, setter(into, strip_option))]
    pub operator_name: Option<String>,
    /// New email sender name.
    #[builder(default, setter(into, strip_option))]
    pub email_name: Option<String>,
    /// New chat name.
    #[builder(default, setter(into, strip_option))]
    pub chat_name: Option<String>,
    /// New email address.
    #[builder(default, setter(into, strip_option))]
    pub email: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl From<&Operator> for OperatorUpdate {
    /// Pushes the editable fields of an operator, skipping empty strings.
    ///
    /// An operator with no departments sends no department list.
    fn from(operator: &Operator) -> Self {
        Self {
            login_id: operator.login_id.clone(),
            departments: (!operator.departments.is_empty()).then(|| operator.departments.clone()),
            operator_name: non_empty(&operator.operator_name),
            email_name: non_empty(&operator.email_name),
            chat_name: non_empty(&operator.chat_name),
            email: non_empty(&operator.email),
        }
    }
}
