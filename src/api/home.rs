use axum::{extract::State, response::Html};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;
use std::sync::Arc;

use super::AppState;
use crate::models::anime::Anime;

/// Home page listing the newest catalog entries.
///
/// # Endpoint
/// `GET /`
pub async fn home(State(state): State<Arc<AppState>>) -> Html<String> {
    let recent = state.catalog.recent(state.config.catalog.home_recent_count);
    Html(render_home(recent))
}

fn render_home(animes: &[Anime]) -> String {
    let mut cards = String::new();
    for anime in animes.iter().rev() {
        render_card(&mut cards, anime);
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Anidex</title>
</head>
<body>
<h1>Recently added</h1>
<ul class="animes">
{cards}</ul>
<p><a href="/api/animes">Browse the API</a></p>
</body>
</html>
"#
    )
}

fn render_card(out: &mut String, anime: &Anime) {
    let title = encode_text(&anime.title);
    let alt = encode_double_quoted_attribute(&anime.title);
    let genres = encode_text(&anime.genres.join(", ")).into_owned();

    let aired = match (anime.season, anime.year) {
        (Some(season), Some(year)) => format!(" &middot; {season} {year}"),
        (None, Some(year)) => format!(" &middot; {year}"),
        _ => anime
            .start_date
            .map(|d| format!(" &middot; {}", d.format("%Y-%m-%d")))
            .unwrap_or_default(),
    };

    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        r#"<li><a href="/api/animes/{id}"><img src="{thumb}" alt="{alt}" loading="lazy"><strong>{title}</strong></a> <span>{kind} &middot; {score:.2}{aired}</span> <em>{genres}</em></li>"#,
        id = anime.id,
        thumb = anime.thumbnail(),
        kind = anime.anime_type,
        score = anime.score,
    );
}
