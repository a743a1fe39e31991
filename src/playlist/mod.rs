use crate::youtube::models::PlaylistEntry;
use rand::Rng;

/// Titles the platform substitutes for entries whose media is gone.
const UNAVAILABLE_TITLES: &[&str] = &["Deleted video", "Private video"];

/// Drop entries whose title marks the media as unavailable. Order of the
/// survivors is preserved; running it twice changes nothing.
pub fn sanitize(mut entries: Vec<PlaylistEntry>) -> Vec<PlaylistEntry> {
    entries.retain(|e| !UNAVAILABLE_TITLES.contains(&e.title.as_str()));
    entries
}

/// Fisher-Yates shuffle, in place: the caller's slice is reordered. Every
/// permutation is equally likely given a uniform `rng`; pass a seeded rng
/// for a reproducible order.
pub fn shuffle<R: Rng + ?Sized>(entries: &mut [PlaylistEntry], rng: &mut R) {
    for i in (1..entries.len()).rev() {
        let j = rng.random_range(0..=i);
        entries.swap(i, j);
    }
}
