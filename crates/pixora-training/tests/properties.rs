// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for callback correlation and webhook signatures.

use std::time::Duration;

use pixora_test_utils::TEST_SIGNING_SECRET;
use pixora_training::correlation::extract_from_url;
use pixora_training::{Correlation, WebhookHeaders, WebhookVerifier, build_callback_url};
use proptest::prelude::*;

const BASE: &str = "https://pixora.test/api/webhooks/training";
const NOW: i64 = 1_700_000_000;

fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(TEST_SIGNING_SECRET, Duration::from_secs(300)).unwrap()
}

proptest! {
    #[test]
    fn correlation_round_trips(
        user_id in "[ -~]{0,40}",
        model_name in "[ -~]{0,40}",
        file_path in "[ -~]{0,60}",
    ) {
        let correlation = Correlation { user_id, model_name, file_path };
        let url = build_callback_url(BASE, &correlation, None, 0).unwrap();
        let parsed = extract_from_url(&url).unwrap();
        prop_assert_eq!(parsed.correlation, correlation);
    }

    #[test]
    fn any_body_mutation_breaks_the_signature(
        body in proptest::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let v = verifier();
        let ts = NOW.to_string();
        let headers = WebhookHeaders {
            id: "msg_1".into(),
            timestamp: ts.clone(),
            signature: v.sign("msg_1", &ts, &body),
        };
        prop_assert!(v.verify_at(&headers, &body, NOW).is_ok());

        let mut mutated = body.clone();
        let i = index.index(mutated.len());
        mutated[i] ^= flip;
        prop_assert!(v.verify_at(&headers, &mutated, NOW).is_err());
    }

    #[test]
    fn a_valid_token_anywhere_in_the_header_verifies(
        body in "[ -~]{0,200}",
        decoys in 0usize..4,
    ) {
        let v = verifier();
        let ts = NOW.to_string();
        let valid = v.sign("msg_2", &ts, body.as_bytes());
        let mut tokens: Vec<String> = (0..decoys)
            .map(|i| format!("v1,{}", "A".repeat(43 + i)))
            .collect();
        tokens.insert(decoys / 2, valid);
        let headers = WebhookHeaders {
            id: "msg_2".into(),
            timestamp: ts,
            signature: tokens.join(" "),
        };
        prop_assert!(v.verify_at(&headers, body.as_bytes(), NOW).is_ok());
    }
}
