use proptest::prelude::*;
use stowage_uri::{Algorithm, ContentUri};

fn protocol() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("sha1".to_string()),
        Just("sha1x".to_string()),
        Just("sha1dir".to_string()),
        Just("md5".to_string()),
        Just("key".to_string()),
    ]
}

proptest! {
    #[test]
    fn reparse_preserves_hash_and_algorithm(
        protocol in protocol(),
        hash in "[0-9a-f]{1,40}",
        ext in proptest::option::of("[a-z]{1,4}"),
        path in proptest::collection::vec("[A-Za-z0-9_-]{1,8}", 0..4),
        manifest in proptest::option::of("[0-9a-f]{40}"),
    ) {
        let mut text = format!("{protocol}://{hash}");
        if let Some(ext) = &ext {
            text.push('.');
            text.push_str(ext);
        }
        for segment in &path {
            text.push('/');
            text.push_str(segment);
        }
        if let Some(manifest) = &manifest {
            text.push_str("?manifest=");
            text.push_str(manifest);
        }

        let first = ContentUri::parse(&text).unwrap();
        let second = ContentUri::parse(&first.to_string()).unwrap();
        prop_assert_eq!(first.hash(), second.hash());
        prop_assert_eq!(first.algorithm(), second.algorithm());
        prop_assert_eq!(&first, &second);

        let bare = ContentUri::parse(&first.bare().to_string()).unwrap();
        prop_assert_eq!(bare.hash(), first.hash());
        prop_assert_eq!(bare.algorithm(), first.algorithm());
    }

    #[test]
    fn digest_hashes_parse_case_insensitively(hash in "[0-9a-fA-F]{40}") {
        let mixed = ContentUri::parse(&format!("sha1://{hash}")).unwrap();
        let lower = ContentUri::parse(&format!("sha1://{}", hash.to_ascii_lowercase())).unwrap();
        prop_assert_eq!(mixed, lower);
    }

    #[test]
    fn unknown_prefix_is_malformed(protocol in "[a-z]{1,8}", hash in "[0-9a-f]{8}") {
        prop_assume!(Algorithm::from_protocol(&protocol).is_none());
        let text = format!("{protocol}://{hash}");
        prop_assert!(ContentUri::parse(&text).is_err());
    }
}

#[test]
fn supported_prefixes_classify() {
    let cases = [
        ("sha1", Algorithm::Sha1),
        ("sha1x", Algorithm::Sha1),
        ("md5", Algorithm::Md5),
        ("key", Algorithm::Key),
    ];
    for (protocol, expected) in cases {
        let uri = ContentUri::parse(&format!("{protocol}://abc123/file")).unwrap();
        assert_eq!(uri.algorithm(), expected, "protocol {protocol}");
    }
}
