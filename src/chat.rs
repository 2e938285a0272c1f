use serde_json::Value;

/// 将JSON文本组件展开为纯文本
///
/// 支持字符串、带 `text`/`extra` 的对象与组件数组；`translate` 组件退化为其键名。
pub fn to_plain(component: &Value) -> String {
    let mut out = String::new();
    flatten(component, &mut out);
    out
}

fn flatten(component: &Value, out: &mut String) {
    match component {
        Value::String(text) => out.push_str(text),
        Value::Array(parts) => parts.iter().for_each(|part| flatten(part, out)),
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                out.push_str(text);
            } else if let Some(key) = map.get("translate").and_then(Value::as_str) {
                out.push_str(key);
            }
            if let Some(Value::Array(extra)) = map.get("extra") {
                extra.iter().for_each(|part| flatten(part, out));
            }
        }
        Value::Null => {}
        other => out.push_str(&other.to_string()),
    }
}
