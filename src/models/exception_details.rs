use crate::models::LimitedLenString;
use serde::Serialize;

/// Exception details of the exception in a chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExceptionDetails {
    /// In case exception is nested (outer exception contains inner one), the id and outerId
    /// properties are used to represent the nesting.
    pub(crate) id: i32,

    /// The value of outerId is a reference to an element in ExceptionDetails that represents the
    /// outer exception.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) outer_id: Option<i32>,

    /// Exception type name.
    pub(crate) type_name: LimitedLenString<1024>,

    /// Exception message.
    pub(crate) message: LimitedLenString<32768>,

    /// Indicates if full exception stack is provided in the exception. The stack may be trimmed,
    /// such as in the case of a StackOverflow exception.
    pub(crate) has_full_stack: bool,

    /// Text describing the stack. Either stack or parsedStack should have a value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) stack: Option<LimitedLenString<32768>>,
}
