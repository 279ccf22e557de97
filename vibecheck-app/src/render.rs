//! Terminal rendering of screens, artist pages and the favorites list.
//!
//! Formatting is kept in plain functions returning strings; the `print_*`
//! functions only pace output through the [`AnimationDriver`].

use chrono::{DateTime, Utc};
use vibecheck_core::{
    AnimationDriver, ArtistPage, ArtistPageKind, ArtistSummary, AudioPreviewController,
    ControlState, FavoriteEntry, Notice, NoticeKind, Screen, TrackRow,
};

/// Play-control identity of a track row.
#[must_use]
pub fn control_id(row: &TrackRow) -> String {
    row.track_id
        .clone()
        .unwrap_or_else(|| format!("row-{}", row.number))
}

#[must_use]
pub fn format_card(index: usize, artist: &ArtistSummary) -> String {
    format!("{:>2}. {} [{}]", index + 1, artist.name, artist.genre)
}

#[must_use]
pub fn format_notice(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Empty => format!("(i) {}", notice.message),
        NoticeKind::Error => format!("(!) {}", notice.message),
        NoticeKind::Credentials => format!(
            "(!) {}. Check [providers.spotify] in {}",
            notice.message,
            vibecheck_core::config_path().display()
        ),
    }
}

/// Pager hint, if paging is possible at all.
#[must_use]
pub fn format_pager(screen: &Screen) -> Option<String> {
    let mut parts = Vec::new();
    if screen.can_go_previous {
        parts.push("prev");
    }
    if screen.can_go_next {
        parts.push("next");
    }
    (!parts.is_empty()).then(|| format!("-- {} --", parts.join(" | ")))
}

#[must_use]
pub fn format_track_row(row: &TrackRow, control: ControlState) -> String {
    let glyph = match (row.has_preview(), control) {
        (false, _) => '-',
        (true, ControlState::Idle) => '>',
        (true, ControlState::Playing) => '"',
    };
    let heart = if row.favorite { '*' } else { ' ' };
    if row.album.is_empty() {
        format!("{:>2}. [{glyph}] {heart} {}", row.number, row.title)
    } else {
        format!(
            "{:>2}. [{glyph}] {heart} {} ({})",
            row.number, row.title, row.album
        )
    }
}

#[must_use]
pub fn format_favorite(index: usize, entry: &FavoriteEntry, now: DateTime<Utc>) -> String {
    let preview = if entry.has_preview { " [preview]" } else { "" };
    format!(
        "{:>2}. {} - {} ({}){preview}",
        index + 1,
        entry.title,
        entry.artist,
        entry.date_label(now)
    )
}

pub async fn print_screen(screen: &Screen, animations: &dyn AnimationDriver) {
    if let Some(heading) = &screen.heading {
        println!("{heading}");
    }
    if let Some(notice) = &screen.notice {
        println!("{}", format_notice(notice));
    }
    for (i, artist) in screen.artists.iter().enumerate() {
        animations.before_item(i).await;
        println!("{}", format_card(i, artist));
    }
    if let Some(pager) = format_pager(screen) {
        println!("{pager}");
    }
}

pub async fn print_artist_page(
    page: &ArtistPage,
    player: &AudioPreviewController,
    animations: &dyn AnimationDriver,
) {
    if let Some(notice) = &page.notice {
        println!("(!) {notice}");
    }
    let Some(profile) = &page.profile else {
        println!("No artist selected.");
        return;
    };

    println!("{}", profile.name);
    println!("{} | {}", profile.followers_label, profile.genre_label);
    if page.kind == ArtistPageKind::Loaded {
        println!("Top tracks:");
    }
    for (i, row) in page.tracks.iter().enumerate() {
        animations.before_item(i).await;
        println!(
            "{}",
            format_track_row(row, player.control_state(&control_id(row)))
        );
    }
}

pub fn print_favorites(entries: &[FavoriteEntry], now: DateTime<Utc>) {
    if entries.is_empty() {
        println!("No favorites yet.");
        return;
    }
    for (i, entry) in entries.iter().enumerate() {
        println!("{}", format_favorite(i, entry, now));
    }
}
