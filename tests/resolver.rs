// tests/resolver.rs
use nowplaying_announcer::resolve::{resolve, SongFields, UNKNOWN_ARTIST};

fn song(title: &str, artist: &str, text: &str) -> SongFields {
    SongFields {
        title: Some(title.into()),
        artist: Some(artist.into()),
        text: Some(text.into()),
        art: None,
    }
}

#[test]
fn explicit_title_and_artist_survive_any_text() {
    let cases = [
        ("Azure", "DJ X", ""),
        ("  Blue Monday ", "New Order  ", "New Order - Blue Monday"),
        ("Title - With Dash", "Artist", "Something - Else"),
    ];
    for (title, artist, text) in cases {
        let id = resolve(&song(title, artist, text));
        assert_eq!(id.title, title.trim());
        assert_eq!(id.artist, artist.trim());
    }
}

#[test]
fn combined_text_splits_on_first_separator() {
    let id = resolve(&song("", "", "A - B - C"));
    assert_eq!(id.artist, "A");
    assert_eq!(id.title, "B - C");
    assert_eq!(id.dedup_key(), "A|B - C");
}

#[test]
fn whitespace_only_fields_count_as_empty() {
    let id = resolve(&song("   ", "\t", "Artist - Track"));
    assert_eq!(id.artist, "Artist");
    assert_eq!(id.title, "Track");
}

#[test]
fn all_empty_means_no_song_with_placeholder_artist() {
    let id = resolve(&song("", "", ""));
    assert_eq!(id.title, "");
    assert_eq!(id.artist, UNKNOWN_ARTIST);
    assert!(!id.is_song());
}

#[test]
fn live_show_text_becomes_title_under_placeholder() {
    let id = resolve(&SongFields {
        text: Some("Saturday Night Live Mix".into()),
        ..Default::default()
    });
    assert!(id.is_song());
    assert_eq!(id.title, "Saturday Night Live Mix");
    assert_eq!(id.dedup_key(), "Unknown/Mix|Saturday Night Live Mix");
}
