//! Property-based tests for the endpoint table.

use postboard_proto::{Endpoint, Method, Request};
use proptest::prelude::*;

fn endpoint_strategy() -> impl Strategy<Value = Endpoint> {
    let id = "[a-f0-9]{1,24}";
    prop_oneof![
        Just(Endpoint::ListPosts),
        Just(Endpoint::CreatePost),
        id.prop_map(|id| Endpoint::UpdatePost { id }),
        id.prop_map(|id| Endpoint::DeletePost { id }),
        Just(Endpoint::Login),
        Just(Endpoint::Register),
        Just(Endpoint::ListUsers),
        id.prop_map(|id| Endpoint::DeleteUser { id }),
    ]
}

proptest! {
    #[test]
    fn prop_paths_stay_under_api_prefix(endpoint in endpoint_strategy()) {
        prop_assert!(endpoint.path().starts_with("/api/"));
    }

    #[test]
    fn prop_item_paths_end_with_id(id in "[a-f0-9]{1,24}") {
        for endpoint in [
            Endpoint::UpdatePost { id: id.clone() },
            Endpoint::DeletePost { id: id.clone() },
            Endpoint::DeleteUser { id: id.clone() },
        ] {
            let suffix = format!("/{id}");
            prop_assert!(endpoint.path().ends_with(&suffix));
        }
    }

    #[test]
    fn prop_bodyless_only_for_get_and_delete(endpoint in endpoint_strategy()) {
        let bodyless = Request::bodyless(endpoint.clone()).is_some();
        let expected = matches!(endpoint.method(), Method::Get | Method::Delete);
        prop_assert_eq!(bodyless, expected);
    }
}
