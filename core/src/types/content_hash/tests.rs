use super::*;

const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

#[test]
fn content_hash_normal_usage() {
    let hash = ContentHash::try_from(CID).unwrap();
    assert_eq!(hash.as_str(), CID);

    let bytes = <ContentHash as redb::Value>::as_bytes(&hash);
    let hash_from_bytes = <ContentHash as redb::Value>::from_bytes(bytes);
    assert_eq!(hash, hash_from_bytes);
}

#[test]
fn content_hash_is_trimmed() {
    let hash = ContentHash::try_from(format!("  {CID}\n").as_str()).unwrap();
    assert_eq!(hash.as_str(), CID);
}

#[test]
fn content_hash_rejects_empty_string() {
    ContentHash::try_from("").unwrap_err();
}

#[test]
fn content_hash_rejects_whitespace_string() {
    ContentHash::try_from("   ").unwrap_err();
}

#[test]
fn content_hash_accepts_long_identifier() {
    let long_string = format!("b{}", "a".repeat(4096));
    let hash = ContentHash::try_from(long_string.as_str()).unwrap();
    assert_eq!(hash.as_str(), long_string);

    let bytes = <ContentHash as redb::Value>::as_bytes(&hash);
    assert_eq!(<ContentHash as redb::Value>::from_bytes(bytes), hash);
}

#[test]
fn content_hash_byte_order_matches_string_order() {
    const HASHES: [&str; 4] = ["Qma", "Qmb", "Qma1", "bafy"];

    for l in HASHES.iter() {
        for r in HASHES.iter() {
            let hash_l = ContentHash::try_from(*l).unwrap();
            let hash_r = ContentHash::try_from(*r).unwrap();
            let bytes_l = <ContentHash as redb::Value>::as_bytes(&hash_l);
            let bytes_r = <ContentHash as redb::Value>::as_bytes(&hash_r);
            assert_eq!(
                <ContentHash as redb::Key>::compare(bytes_l, bytes_r),
                l.cmp(r),
                "Comparing '{}' and '{}'",
                l,
                r
            );
            assert_eq!(hash_l.cmp(&hash_r), l.cmp(r));
        }
    }
}
