//! Prompt/response codec.
//!
//! Renders the brief catalog into the instruction prompt and turns the
//! model's free-form reply back into a [`MatchResult`]. Models rarely return
//! a bare JSON document, so extraction takes the outermost `{ ... }` span
//! and ignores prose or code fences around it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use cmdrouter_core::RouterError;

use crate::catalog::CommandBrief;

/// First `{` through last `}`, across newlines.
static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

// ---------------------------------------------------------------------------
// Match result
// ---------------------------------------------------------------------------

/// The model's verdict for one user message.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Matched {
        id: u32,
        parameters: Vec<String>,
        confidence: Option<f64>,
    },
    NotMatched {
        reason: String,
    },
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

#[derive(Debug, Deserialize)]
struct RawReply {
    matched: bool,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Serialize briefs as a JSON array, one flat record per line.
pub fn render_catalog<'a>(briefs: impl IntoIterator<Item = &'a CommandBrief>) -> String {
    let lines: Vec<String> = briefs
        .into_iter()
        .filter_map(|b| serde_json::to_string(b).ok())
        .collect();
    if lines.is_empty() {
        return "[]".to_string();
    }
    format!("[\n{}\n]", lines.join(",\n"))
}

/// Build the instruction prompt for one user message.
pub fn build_catalog_prompt(catalog: &str, user_message: &str) -> String {
    format!(
        r#"你是一个智能指令解析器。请分析用户的消息，判断用户意图是否匹配以下指令的效果。
要求：
1. 只匹配一个指令
2. 参数无论个数都返回数组（列表）类型
3. 返回的参数符合指令要求的参数个数、类型
4. 如果一个参数类型是GreedyStr，说明接受一个以空格作为分隔符的含有多个内容的字符串，这个字符串应该作为放在数组末尾

可用指令列表：
{catalog}

用户消息: "{user_message}"

请按以下格式分析：
1. 如果匹配某个指令，请返回：
   {{
     "matched": true,
     "plugin_name": "xxx", // 匹配指令所属的插件, string
     "function_name": "xx", // 匹配指令的函数名称, string
     "id": xxx, // 匹配指令的唯一id, int
     "parameters": [arg1, arg2, ...], // 匹配指令的参数, array<string>
     "confidence": number // 匹配置信度, float, 取值0 ~ 1
   }}

2. 如果不匹配任何指令，请返回：
   {{
     "matched": false,
     "reason": "xxx" // 不匹配的原因简要说明
   }}

请确保参数提取准确，只返回JSON格式的字符串结果，不要有任何其他的文本信息。"#
    )
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Extract the JSON object embedded in a model reply.
pub fn extract_json_object(raw_text: &str) -> Option<&str> {
    JSON_OBJECT_RE.find(raw_text).map(|m| m.as_str())
}

/// Parse a model reply into a [`MatchResult`].
///
/// Fails with [`RouterError::ResponseParse`] when no object is present or
/// the object does not have one of the two expected shapes.
pub fn parse_response(raw_text: &str) -> Result<MatchResult, RouterError> {
    let body = extract_json_object(raw_text)
        .ok_or_else(|| RouterError::ResponseParse("no JSON object in model reply".into()))?;

    let reply: RawReply = serde_json::from_str(body)
        .map_err(|e| RouterError::ResponseParse(format!("invalid reply object: {e}")))?;

    if !reply.matched {
        return Ok(MatchResult::NotMatched { reason: reply.reason.unwrap_or_default() });
    }

    let id = match reply.id {
        Some(value) => parse_id(&value)?,
        None => return Err(RouterError::ResponseParse("matched reply without id".into())),
    };
    let parameters = match reply.parameters {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(parameter_text).collect::<Result<_, _>>()?,
        Some(other) => {
            let message = format!("parameters must be an array, got {other}");
            return Err(RouterError::ResponseParse(message));
        }
    };

    Ok(MatchResult::Matched { id, parameters, confidence: reply.confidence })
}

fn parse_id(value: &Value) -> Result<u32, RouterError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| RouterError::ResponseParse(format!("invalid command id {value}")))
}

fn parameter_text(value: &Value) -> Result<String, RouterError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(RouterError::ResponseParse(format!("unsupported parameter value {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_extracts_object_from_fenced_prose() {
        let raw = "Sure, here you go:\n```\n{\"matched\": false, \"reason\": \"no match\"}\n```";
        assert_eq!(
            extract_json_object(raw),
            Some("{\"matched\": false, \"reason\": \"no match\"}")
        );
        assert_eq!(
            parse_response(raw).unwrap(),
            MatchResult::NotMatched { reason: "no match".into() }
        );
    }

    #[test]
    fn test_matched_reply() {
        let raw = r#"{"matched":true,"plugin_name":"moderation","function_name":"mute","id":3,"parameters":["alice"],"confidence":0.9}"#;
        assert_eq!(
            parse_response(raw).unwrap(),
            MatchResult::Matched { id: 3, parameters: vec!["alice".into()], confidence: Some(0.9) }
        );
    }

    #[test]
    fn test_multiline_object_and_scalar_parameters() {
        let raw = "好的：\n{\n  \"matched\": true,\n  \"id\": \"7\",\n  \"parameters\": [\"bob\", 30, true]\n}\n以上";
        let parsed = parse_response(raw).unwrap();
        assert_eq!(
            parsed,
            MatchResult::Matched {
                id: 7,
                parameters: vec!["bob".into(), "30".into(), "true".into()],
                confidence: None,
            }
        );
        assert!(parsed.is_matched());
    }

    #[test]
    fn test_missing_parameters_means_empty() {
        let parsed = parse_response(r#"{"matched": true, "id": 1}"#).unwrap();
        assert_eq!(parsed, MatchResult::Matched { id: 1, parameters: vec![], confidence: None });
    }

    #[test]
    fn test_parse_failures() {
        for raw in [
            "I could not find anything.",
            "{not json}",
            r#"{"matched": true, "parameters": []}"#,
            r#"{"matched": true, "id": -1}"#,
            r#"{"matched": true, "id": 2, "parameters": "alice"}"#,
            r#"{"matched": true, "id": 2, "parameters": [["nested"]]}"#,
            r#"{"reason": "no matched flag"}"#,
        ] {
            assert!(
                matches!(parse_response(raw), Err(RouterError::ResponseParse(_))),
                "expected parse error for {raw:?}"
            );
        }
    }

    #[test]
    fn test_prompt_embeds_catalog_and_message() {
        let brief = CommandBrief {
            full_description: "插件描述：群管理\n指令描述：禁言".into(),
            plugin_name: "moderation".into(),
            function_name: "mute".into(),
            command_name: "mute".into(),
            aliases: vec![],
            args: IndexMap::from([("user".to_string(), "str".to_string())]),
            id: 1,
        };
        let catalog = render_catalog([&brief]);
        assert!(catalog.starts_with("[\n{"));
        assert!(catalog.contains(r#""args":{"user":"str"}"#));

        let prompt = build_catalog_prompt(&catalog, "帮我禁言一下alice");
        assert!(prompt.contains(&catalog));
        assert!(prompt.contains("用户消息: \"帮我禁言一下alice\""));
        assert!(prompt.contains("\"matched\": false"));
        assert!(prompt.contains("只返回JSON"));
        assert_eq!(render_catalog(std::iter::empty()), "[]");
    }
}
