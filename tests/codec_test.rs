use vr_video_sync::video::{
    FALLBACK_FOURCC, alternative_container, codec_for_tag, fourcc_chars, fourcc_from_code, is_printable,
};

#[test]
fn test_fourcc_little_endian() {
    assert_eq!(fourcc_from_code(0x3163_7661), "avc1");
    assert_eq!(fourcc_from_code(u32::from_le_bytes(*b"mp4v")), "mp4v");
}

#[test]
fn test_non_printable_falls_back() {
    let zero = fourcc_from_code(0);
    assert!(!is_printable(&zero));
    let choice = codec_for_tag(Some(&zero));
    assert_eq!(choice.fourcc, FALLBACK_FOURCC);
    assert_eq!(choice.extension, ".mp4");

    let high = fourcc_from_code(0xff00_ff00);
    assert!(!is_printable(&high));
    assert_eq!(codec_for_tag(Some(&high)).fourcc, "mp4v");
}

#[test]
fn test_missing_and_unmapped_tags_fall_back() {
    assert_eq!(codec_for_tag(None).fourcc, "mp4v");
    let unknown = codec_for_tag(Some("zzzz"));
    assert_eq!(unknown.fourcc, "mp4v");
    assert_eq!(unknown.extension, ".mp4");
}

#[test]
fn test_each_tag_maps_to_one_container() {
    for (tag, ext) in [
        ("avc1", ".mp4"),
        ("mp4v", ".mp4"),
        ("H264", ".mp4"),
        ("HEVC", ".mp4"),
        ("H265", ".mp4"),
        ("XVID", ".avi"),
        ("MJPG", ".avi"),
        ("FFV1", ".avi"),
        ("jpeg", ".mov"),
        ("apch", ".mov"),
        ("VP90", ".mkv"),
    ] {
        let choice = codec_for_tag(Some(tag));
        assert_eq!(choice.fourcc, tag);
        assert_eq!(choice.extension, ext, "{}", tag);
    }
}

#[test]
fn test_ambiguous_tags_resolve_to_mp4() {
    for (tag, other) in [("avc1", ".mov"), ("mp4v", ".mov"), ("H265", ".mkv"), ("HEVC", ".mkv")] {
        assert_eq!(alternative_container(tag), Some(other));
        assert_eq!(codec_for_tag(Some(tag)).extension, ".mp4");
    }
    assert_eq!(alternative_container("XVID"), None);
}

#[test]
fn test_writer_fourcc_chars() {
    assert_eq!(fourcc_chars("MJPG"), Some(['M', 'J', 'P', 'G']));
    assert_eq!(fourcc_chars("prores"), None);

    let prores = codec_for_tag(Some("prores"));
    assert_eq!(prores.extension, ".mov");
    assert_eq!(prores.fourcc_chars(), ['m', 'p', '4', 'v']);
    assert_eq!(codec_for_tag(Some("avc1")).fourcc_chars(), ['a', 'v', 'c', '1']);
}
