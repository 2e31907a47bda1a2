//! 엔티티 계약.
//!
//! 모든 엔티티는 평범한 키-값 매핑으로 펼쳐지고(`to_mapping`),
//! 매핑에서 다시 만들어지며(`from_mapping`), 스스로 필수 필드를 검증한다(`validate`).
//! 요청 본문 직렬화와 응답 결과/에러 객체 검증에 모두 쓰인다.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

/// JSON 객체 (문자열 키 → 값)
pub type JsonObject = serde_json::Map<String, Value>;

/// 엔티티 기본 계약
///
/// 기본 구현은 serde를 통해 중첩 엔티티, 시퀀스, 매핑을 모두 평범한 값으로 펼친다.
/// 필드가 조용히 누락되지 않도록 `#[serde(skip)]`은 쓰지 않는다.
pub trait Model: Serialize + DeserializeOwned {
    /// 엔티티를 키-값 매핑으로 변환
    fn to_mapping(&self) -> Result<JsonObject, CoreError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(CoreError::Validation {
                field: std::any::type_name::<Self>().to_string(),
                message: format!("객체가 아닌 값으로 직렬화됨: {}", json_type_name(&other)),
            }),
        }
    }

    /// 키-값 매핑에서 엔티티 생성
    fn from_mapping(mapping: &JsonObject) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(Value::Object(mapping.clone()))?)
    }

    /// 필수/선택 필드 검증
    ///
    /// 기본값은 모두 허용. 실패 시 첫 번째로 누락/잘못된 필드를 보고한다.
    fn validate(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// 필수 필드 누락 에러
pub fn missing_field(field: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: format!("Object without {field} is not valid"),
    }
}

/// JSON 값 종류 이름 (로그/에러 메시지용)
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        label: String,
    }

    impl Model for Tag {}

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u64,
        name: Option<String>,
        tags: Vec<Tag>,
        attributes: BTreeMap<String, Tag>,
        owner: Option<Tag>,
    }

    impl Model for Item {
        fn validate(&self) -> Result<(), CoreError> {
            match &self.name {
                Some(name) if !name.is_empty() => Ok(()),
                _ => Err(missing_field("name")),
            }
        }
    }

    fn sample() -> Item {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "color".to_string(),
            Tag {
                label: "red".to_string(),
            },
        );
        Item {
            id: 42,
            name: Some("Widget".to_string()),
            tags: vec![Tag {
                label: "new".to_string(),
            }],
            attributes,
            owner: None,
        }
    }

    #[test]
    fn to_mapping_expands_nested_values() {
        let mapping = sample().to_mapping().unwrap();
        assert_eq!(mapping["id"], json!(42));
        assert_eq!(mapping["tags"], json!([{ "label": "new" }]));
        assert_eq!(mapping["attributes"], json!({ "color": { "label": "red" } }));
        // None 필드도 누락되지 않는다
        assert!(mapping.contains_key("owner"));
        assert_eq!(mapping["owner"], Value::Null);
    }

    #[test]
    fn from_mapping_reads_back() {
        let item = sample();
        let mapping = item.to_mapping().unwrap();
        assert_eq!(Item::from_mapping(&mapping).unwrap(), item);
    }

    #[test]
    fn from_mapping_rejects_wrong_shape() {
        let mut mapping = JsonObject::new();
        mapping.insert("id".to_string(), json!("not a number"));
        assert_matches!(Item::from_mapping(&mapping), Err(CoreError::Serialization(_)));
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let mut item = sample();
        item.name = None;
        let err = item.validate().unwrap_err();
        assert_matches!(err, CoreError::Validation { ref field, .. } if field == "name");
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn default_validate_accepts() {
        let tag = Tag {
            label: String::new(),
        };
        assert!(tag.validate().is_ok());
    }

    #[test]
    fn non_object_model_is_rejected() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper(u32);
        impl Model for Wrapper {}

        let err = Wrapper(7).to_mapping().unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });
    }
}
