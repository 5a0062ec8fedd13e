//! MQTT topic 过滤器匹配。
//!
//! - `+` 匹配且仅匹配一层（可以是空层）
//! - `#` 只能出现在最后一层，匹配其后任意层（含零层）
//! - 以 `$` 开头的 topic 不被首层通配符匹配

/// 校验订阅过滤器是否合法。
pub fn validate_filter(filter: &str) -> Result<(), String> {
    if filter.is_empty() {
        return Err("empty topic filter".to_string());
    }
    let levels: Vec<&str> = filter.split('/').collect();
    let last = levels.len() - 1;
    for (index, level) in levels.iter().enumerate() {
        if level.contains('#') && (*level != "#" || index != last) {
            return Err(format!("'#' must be the whole last level: {}", filter));
        }
        if level.contains('+') && *level != "+" {
            return Err(format!("'+' must occupy a whole level: {}", filter));
        }
    }
    Ok(())
}

/// 判断 topic 是否匹配过滤器。
pub fn filter_matches(filter: &str, topic: &str) -> bool {
    if topic.starts_with('$') && (filter.starts_with('+') || filter.starts_with('#')) {
        return false;
    }
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// 取出过滤器中第一个 `+` 在 topic 中对应的层。
///
/// topic 不匹配或过滤器不含 `+` 时返回 `None`。
pub fn wildcard_segment<'a>(filter: &str, topic: &'a str) -> Option<&'a str> {
    if !filter_matches(filter, topic) {
        return None;
    }
    let position = filter.split('/').position(|level| level == "+")?;
    topic.split('/').nth(position)
}
