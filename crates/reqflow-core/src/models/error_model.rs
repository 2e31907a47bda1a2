//! 백엔드 에러 객체.
//!
//! 와이어 형식: `{"error": {"description": "<string>", "code": <number>}}`.
//! 둘 중 하나라도 없으면 에러 객체로 인정하지 않는다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApplicationError, CoreError};
use crate::models::model::{JsonObject, Model};

/// 에러 객체 최상위 키
pub const ERROR_KEY: &str = "error";

/// 응답 본문에서 읽어낸 에러 객체
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorModel {
    /// 사람이 읽을 수 있는 설명
    pub description: Option<String>,
    /// 백엔드 에러 코드
    pub code: Option<i64>,
}

impl ErrorModel {
    /// 응답 객체의 `"error"` 하위 객체에서 읽기
    ///
    /// 형식이 맞지 않는 필드는 비어 있는 것으로 취급한다. 판정은 [`Model::validate`]가 한다.
    pub fn from_response(response: &JsonObject) -> Self {
        let Some(error) = response.get(ERROR_KEY).and_then(Value::as_object) else {
            return Self::default();
        };

        Self {
            description: error
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            code: error.get("code").and_then(integer_code),
        }
    }

    /// 검증을 통과한 경우에만 [`ApplicationError`]로 변환
    pub fn into_application_error(self) -> Result<ApplicationError, CoreError> {
        self.validate()?;
        match (self.description, self.code) {
            (Some(description), Some(code)) => Ok(ApplicationError { description, code }),
            _ => Err(CoreError::Internal("검증된 에러 객체에 필드 누락".to_string())),
        }
    }
}

impl Model for ErrorModel {
    fn validate(&self) -> Result<(), CoreError> {
        let failed = match (&self.description, &self.code) {
            (None, _) => Some("description"),
            (Some(d), _) if d.is_empty() => Some("description"),
            (_, None) => Some("code"),
            _ => None,
        };

        match failed {
            Some(field) => Err(CoreError::Validation {
                field: field.to_string(),
                message: format!("Error object without {field} is not valid. Mapping failed."),
            }),
            None => Ok(()),
        }
    }
}

impl TryFrom<&JsonObject> for ApplicationError {
    type Error = CoreError;

    fn try_from(response: &JsonObject) -> Result<Self, Self::Error> {
        ErrorModel::from_response(response).into_application_error()
    }
}

/// 정수 코드 읽기 (`404`와 `404.0` 모두 허용)
fn integer_code(value: &Value) -> Option<i64> {
    if let Some(code) = value.as_i64() {
        return Some(code);
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.is_finite())
        .map(|f| f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("object expected"),
        }
    }

    #[test]
    fn well_formed_error_object() {
        let response = object(json!({ "error": { "description": "not found", "code": 404 } }));
        let err = ApplicationError::try_from(&response).unwrap();
        assert_eq!(err.description, "not found");
        assert_eq!(err.code, 404);
    }

    #[test]
    fn float_code_is_accepted_when_integral() {
        let response = object(json!({ "error": { "description": "gone", "code": 410.0 } }));
        assert_eq!(ApplicationError::try_from(&response).unwrap().code, 410);
    }

    #[test]
    fn missing_description_fails() {
        let response = object(json!({ "error": { "code": 500 } }));
        let err = ApplicationError::try_from(&response).unwrap_err();
        assert_matches!(err, CoreError::Validation { ref field, .. } if field == "description");
        assert!(err
            .to_string()
            .contains("Error object without description is not valid"));
    }

    #[test]
    fn empty_description_fails() {
        let response = object(json!({ "error": { "description": "", "code": 500 } }));
        assert!(ApplicationError::try_from(&response).is_err());
    }

    #[test]
    fn missing_code_fails() {
        let response = object(json!({ "error": { "description": "boom" } }));
        let err = ApplicationError::try_from(&response).unwrap_err();
        assert_matches!(err, CoreError::Validation { ref field, .. } if field == "code");
    }

    #[test]
    fn string_code_is_not_a_code() {
        let response = object(json!({ "error": { "description": "boom", "code": "E42" } }));
        assert!(ApplicationError::try_from(&response).is_err());
    }

    #[test]
    fn missing_error_key_fails() {
        let response = object(json!({ "id": 42, "name": "Widget" }));
        let model = ErrorModel::from_response(&response);
        assert_eq!(model, ErrorModel::default());
        assert!(model.validate().is_err());
    }

    #[test]
    fn error_key_not_an_object_fails() {
        let response = object(json!({ "error": "not found" }));
        assert!(ApplicationError::try_from(&response).is_err());
    }
}
