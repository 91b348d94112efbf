use serde::Serialize;

/// One discrete instruction for the remote cursor endpoint. These are
/// serialized as JSON text frames with a `type` discriminator, which is
/// the shape the remote server's input queue expects.
///
/// `Move` and `Scroll` carry incremental offsets, never absolute
/// positions; replaying them out of order would corrupt the remote
/// cursor, which is why the emitter drops rather than buffers.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// A full left click (button down + up on the remote side).
    Press,
    /// Left button down, held until `Up`.
    Down,
    Up,
    Move { dx: f64, dy: f64 },
    Scroll { dy: f64 },
    /// A full right click.
    RightPress,
    Key { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_carries_type_tag_and_deltas() {
        let json = serde_json::to_string(&Command::Move { dx: 3.0, dy: -2.5 }).unwrap();
        assert_eq!(json, r#"{"type":"move","dx":3.0,"dy":-2.5}"#);
    }

    #[test]
    fn discrete_commands_serialize_to_bare_tags() {
        let json = serde_json::to_string(&Command::RightPress).unwrap();
        assert_eq!(json, r#"{"type":"right_press"}"#);
        let json = serde_json::to_string(&Command::Press).unwrap();
        assert_eq!(json, r#"{"type":"press"}"#);
    }

    #[test]
    fn key_uses_key_field() {
        let cmd = Command::Key { key: "Enter".to_string() };
        assert_eq!(
            serde_json::to_string(&cmd).unwrap(),
            r#"{"type":"key","key":"Enter"}"#
        );
    }
}
