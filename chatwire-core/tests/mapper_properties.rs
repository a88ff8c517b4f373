//! Property tests for the host-to-wire message mapping

use chatwire_core::protocol::{HostMessage, HostPart, HostRole, ToolResultContent};
use chatwire_core::providers::openai::{to_wire_messages, WireMessage};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum UserPart {
    Text(String),
    Result(String, String),
}

fn user_part() -> impl Strategy<Value = UserPart> {
    prop_oneof![
        "[ a-z]{0,12}".prop_map(UserPart::Text),
        ("call_[a-z0-9]{1,8}", "[a-z ]{0,16}").prop_map(|(id, text)| UserPart::Result(id, text)),
    ]
}

fn user_message(parts: &[UserPart]) -> HostMessage {
    parts.iter().fold(HostMessage::new(HostRole::User), |message, part| {
        message.with_part(match part {
            UserPart::Text(text) => HostPart::text(text.clone()),
            UserPart::Result(id, text) => {
                HostPart::tool_result(id.clone(), vec![ToolResultContent::text(text.clone())])
            }
        })
    })
}

proptest! {
    #[test]
    fn tool_messages_follow_tool_results_in_order(parts in prop::collection::vec(user_part(), 0..12)) {
        let wire = to_wire_messages(&[user_message(&parts)]);

        let expected_ids: Vec<&str> = parts
            .iter()
            .filter_map(|part| match part {
                UserPart::Result(id, _) => Some(id.as_str()),
                UserPart::Text(_) => None,
            })
            .collect();
        let tool_ids: Vec<&str> = wire
            .iter()
            .filter_map(|message| match message {
                WireMessage::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();
        prop_assert_eq!(&tool_ids, &expected_ids);

        let text: String = parts
            .iter()
            .filter_map(|part| match part {
                UserPart::Text(text) => Some(text.as_str()),
                UserPart::Result(..) => None,
            })
            .collect();
        let user_messages = wire.iter().filter(|m| matches!(m, WireMessage::User { .. })).count();
        let expect_user = !text.trim().is_empty() || expected_ids.is_empty();
        prop_assert_eq!(user_messages, usize::from(expect_user));
        prop_assert_eq!(wire.len(), expected_ids.len() + usize::from(expect_user));
    }

    #[test]
    fn assistant_turn_maps_to_exactly_one_message(
        texts in prop::collection::vec("[a-z]{0,8}", 0..6),
        calls in prop::collection::vec("call_[0-9]{1,4}", 0..4),
    ) {
        let mut message = HostMessage::new(HostRole::Assistant);
        for text in &texts {
            message = message.with_part(HostPart::text(text.clone()));
        }
        for id in &calls {
            message = message.with_part(HostPart::tool_call(id.clone(), "run", serde_json::json!({})));
        }

        let wire = to_wire_messages(&[message]);
        prop_assert_eq!(wire.len(), 1);
        match &wire[0] {
            WireMessage::Assistant { content, tool_calls, reasoning_details } => {
                prop_assert_eq!(content, &texts.concat());
                let ids: Vec<&str> = tool_calls.iter().flatten().map(|c| c.id.as_str()).collect();
                prop_assert_eq!(ids, calls.iter().map(String::as_str).collect::<Vec<_>>());
                prop_assert_eq!(tool_calls.is_none(), calls.is_empty());
                prop_assert!(reasoning_details.is_none());
            }
            other => prop_assert!(false, "unexpected message {:?}", other),
        }
    }
}
