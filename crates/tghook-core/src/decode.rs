use tghook_telegram::TelegramUpdate;

use crate::WebhookError;

/// Parses an inbound delivery body. Updates without a `message` (callback
/// queries, edits, channel posts) decode fine with those fields absent.
pub fn decode_update(body: &[u8]) -> Result<TelegramUpdate, WebhookError> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_message_update() {
        let update = decode_update(
            br#"{"update_id":9,"message":{"message_id":3,"chat":{"id":42,"type":"private"},"from":{"id":1,"username":"alice"},"text":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(update.update_id, 9);
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.from.unwrap().id, 1);
        assert_eq!(message.text.as_deref(), Some("hi"));
    }

    #[test]
    fn non_message_events_decode_without_message() {
        let callback = decode_update(
            br#"{"update_id":1,"callback_query":{"id":"q1","from":{"id":5},"data":"x"}}"#,
        )
        .unwrap();
        assert!(callback.message.is_none());
        assert_eq!(callback.callback_query.unwrap().data.as_deref(), Some("x"));

        let edited = decode_update(
            br#"{"update_id":2,"edited_message":{"chat":{"id":42},"text":"fixed"}}"#,
        )
        .unwrap();
        assert!(edited.message.is_none());
        assert!(edited.edited_message.is_some());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let update = decode_update(br#"{"update_id":3,"my_chat_member":{"chat":{"id":1}}}"#).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn empty_and_non_json_bodies_are_decode_errors() {
        let bodies: [&[u8]; 4] = [b"", b"not json", b"{\"message\":", b"42"];
        for body in bodies {
            assert!(matches!(decode_update(body), Err(WebhookError::Decode(_))));
        }
    }
}
