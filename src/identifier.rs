use crate::error::{McWireError, Result};

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '.' | '_' | '-')
}

fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

/// 验证命名空间标识符 `(namespace:)?path`
///
/// 命名空间允许 `[a-z0-9._-]`，路径额外允许 `/`。
pub fn validate_identifier(value: &str) -> Result<()> {
    let (namespace, path) = match value.split_once(':') {
        Some((namespace, path)) => (Some(namespace), path),
        None => (None, value),
    };

    let namespace_ok =
        namespace.map_or(true, |ns| !ns.is_empty() && ns.chars().all(is_namespace_char));
    let path_ok = !path.is_empty() && path.chars().all(is_path_char);

    if namespace_ok && path_ok {
        Ok(())
    } else {
        Err(McWireError::InvalidIdentifier(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for id in [
            "minecraft:stone",
            "stone",
            "minecraft:textures/block/stone.png",
            "my_mod-1.2:thing",
            "minecraft:brand",
        ] {
            assert!(validate_identifier(id).is_ok(), "{id}");
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for id in [
            "Minecraft:Stone",
            "minecraft:",
            ":stone",
            "",
            "name/space:path",
            "a:b:c",
            "minecraft:white space",
        ] {
            assert!(
                matches!(validate_identifier(id), Err(McWireError::InvalidIdentifier(_))),
                "{id}"
            );
        }
    }
}
