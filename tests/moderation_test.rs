//! Tests for curse word matching and vote extension handling.

use chat_moderation::moderation::{
    aggregate_vote_extensions, contains_curse_word, encode_vote_extension, find_duplicate_word,
    is_well_formed_vote_extension, split_words, vote_extension_words, CurseWords, ModerationError,
};

#[test]
fn curse_words_are_matched_per_word_ignoring_case() {
    let curse_words = CurseWords::new(["Idiot", "moron", ""]);
    assert_eq!(curse_words.len(), 2);

    assert!(contains_curse_word("you idiot", &curse_words));
    assert!(contains_curse_word("IDIOT!", &curse_words));
    assert!(contains_curse_word("what a...moron?", &curse_words));
    assert!(!contains_curse_word("idiotic", &curse_words));
    assert!(!contains_curse_word("hello there", &curse_words));
    assert!(!contains_curse_word("", &curse_words));
}

#[test]
fn no_curse_words_match_nothing() {
    let curse_words = CurseWords::default();
    assert!(curse_words.is_empty());
    assert!(!contains_curse_word("you idiot", &curse_words));
}

#[test]
fn union_adds_vote_extension_words() {
    let local = CurseWords::new(["idiot"]);
    let union = local.union_with(&["Jerk".to_string(), "idiot".to_string()]);

    assert_eq!(union.len(), 2);
    assert!(union.contains("jerk"));
    assert!(union.contains("IDIOT"));
    assert!(!local.contains("jerk"));
}

#[test]
fn aggregation_skips_empty_extensions_and_keeps_duplicates() {
    let extensions = vec![
        b"jerk|doofus".as_slice(),
        b"".as_slice(),
        b"nitwit".as_slice(),
        b"jerk".as_slice(),
    ];
    let aggregate = aggregate_vote_extensions(extensions);
    assert_eq!(aggregate, "jerk|doofus|nitwit|jerk");

    assert_eq!(
        split_words(&aggregate),
        vec!["jerk", "doofus", "nitwit", "jerk"]
    );
    assert_eq!(
        vote_extension_words(&aggregate),
        Err(ModerationError::DuplicateWord {
            word: "jerk".to_string()
        })
    );
}

#[test]
fn aggregation_of_no_extensions_is_empty() {
    let aggregate = aggregate_vote_extensions(Vec::<&[u8]>::new());
    assert_eq!(aggregate, "");
    assert_eq!(vote_extension_words(&aggregate), Ok(vec![]));
}

#[test]
fn duplicates_are_found_after_normalization() {
    let words = split_words(" Jerk |doofus|jerk");
    assert_eq!(find_duplicate_word(&words), Some(&"jerk".to_string()));
    assert_eq!(find_duplicate_word(&split_words("jerk|doofus")), None);
}

#[test]
fn encoded_vote_extension_is_normalized() {
    let encoded = encode_vote_extension(&[
        "Jerk".to_string(),
        "".to_string(),
        "doofus".to_string(),
    ]);
    assert_eq!(encoded, b"jerk|doofus".to_vec());

    let encoded = encode_vote_extension(&[
        "Jerk".to_string(),
        "jerk ".to_string(),
        "doofus".to_string(),
        "JERK".to_string(),
    ]);
    assert_eq!(encoded, b"jerk|doofus".to_vec());
    assert!(is_well_formed_vote_extension(&encoded));
    assert!(encode_vote_extension(&[]).is_empty());
}
