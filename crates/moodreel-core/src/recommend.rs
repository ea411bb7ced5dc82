//! Genre selection from inferred attributes.
//!
//! Pure mapping from (emotion, age) to catalog genre ids: age bands are
//! evaluated first, the emotion table applies inside the two adult bands.

use crate::types::{Emotion, Gender};
use serde::{Deserialize, Serialize};

/// Catalog genre identifier (TMDB numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenreId(pub u16);

// TMDB genre ids used by the tables below.
const ACTION: GenreId = GenreId(28);
const ADVENTURE: GenreId = GenreId(12);
const ANIMATION: GenreId = GenreId(16);
const COMEDY: GenreId = GenreId(35);
const CRIME: GenreId = GenreId(80);
const DOCUMENTARY: GenreId = GenreId(99);
const DRAMA: GenreId = GenreId(18);
const FAMILY: GenreId = GenreId(10751);
const HISTORY: GenreId = GenreId(36);
const HORROR: GenreId = GenreId(27);
const MYSTERY: GenreId = GenreId(9648);
const ROMANCE: GenreId = GenreId(10749);
const SCIENCE_FICTION: GenreId = GenreId(878);
const THRILLER: GenreId = GenreId(53);

/// At most this many genres are queried downstream per request.
const MAX_GENRES: usize = 2;

// Age band edges; first match wins.
const CHILD_MAX_AGE: u32 = 13;
const TEEN_MAX_AGE: u32 = 18;
const YOUNG_ADULT_MAX_AGE: u32 = 30;

/// Emotion-keyed genre rows for the adult bands. `None` for emotions the
/// table does not map (the band default applies).
fn emotion_genres(emotion: Emotion) -> Option<&'static [GenreId]> {
    match emotion {
        Emotion::Happy => Some(&[COMEDY, FAMILY, ANIMATION]),
        Emotion::Sad => Some(&[DRAMA, ROMANCE]),
        Emotion::Angry => Some(&[ACTION, THRILLER, CRIME]),
        Emotion::Fear => Some(&[HORROR, MYSTERY]),
        Emotion::Surprise => Some(&[ADVENTURE, SCIENCE_FICTION]),
        Emotion::Disgust => Some(&[DOCUMENTARY, HISTORY]),
        Emotion::Neutral => Some(&[DRAMA, COMEDY, ACTION]),
        Emotion::Unknown => None,
    }
}

/// Select the genres to query for a set of inferred attributes.
///
/// Total over every (emotion, age) pair and never empty. `gender` is part
/// of the attribute record but does not influence the mapping.
pub fn select_genres(emotion: Emotion, age: u32, _gender: Gender) -> Vec<GenreId> {
    let set: &[GenreId] = if age < CHILD_MAX_AGE {
        &[ANIMATION, FAMILY]
    } else if age < TEEN_MAX_AGE {
        &[ADVENTURE, ANIMATION, COMEDY, FAMILY]
    } else if age < YOUNG_ADULT_MAX_AGE {
        emotion_genres(emotion).unwrap_or(&[ACTION, COMEDY, SCIENCE_FICTION])
    } else {
        emotion_genres(emotion).unwrap_or(&[DRAMA, THRILLER, HISTORY])
    };

    set.iter().copied().take(MAX_GENRES).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_band_ignores_emotion() {
        assert_eq!(
            select_genres(Emotion::Happy, 10, Gender::Unknown),
            vec![ANIMATION, FAMILY]
        );
        assert_eq!(
            select_genres(Emotion::Angry, 10, Gender::Unknown),
            vec![ANIMATION, FAMILY]
        );
    }

    #[test]
    fn test_teen_band() {
        assert_eq!(
            select_genres(Emotion::Sad, 15, Gender::Male),
            vec![ADVENTURE, ANIMATION]
        );
    }

    #[test]
    fn test_young_adult_happy_row_truncated() {
        // First 2 entries of the happy row.
        assert_eq!(
            select_genres(Emotion::Happy, 25, Gender::Female),
            vec![COMEDY, FAMILY]
        );
    }

    #[test]
    fn test_young_adult_unmapped_emotion_falls_back() {
        assert_eq!(
            select_genres(Emotion::Unknown, 25, Gender::Unknown),
            vec![ACTION, COMEDY]
        );
    }

    #[test]
    fn test_over_thirty_unmapped_emotion_falls_back() {
        assert_eq!(
            select_genres(Emotion::Unknown, 40, Gender::Unknown),
            vec![DRAMA, THRILLER]
        );
    }

    #[test]
    fn test_over_thirty_fear_row() {
        assert_eq!(
            select_genres(Emotion::Fear, 55, Gender::Male),
            vec![HORROR, MYSTERY]
        );
    }

    #[test]
    fn test_band_boundaries() {
        // 12 is a child, 13 a teen; 17 a teen, 18 a young adult; 29 a young
        // adult, 30 the older band.
        assert_eq!(select_genres(Emotion::Happy, 12, Gender::Unknown)[0], ANIMATION);
        assert_eq!(select_genres(Emotion::Happy, 13, Gender::Unknown)[0], ADVENTURE);
        assert_eq!(select_genres(Emotion::Happy, 17, Gender::Unknown)[0], ADVENTURE);
        assert_eq!(select_genres(Emotion::Happy, 18, Gender::Unknown)[0], COMEDY);
        assert_eq!(select_genres(Emotion::Sad, 29, Gender::Unknown)[0], DRAMA);
        assert_eq!(select_genres(Emotion::Sad, 30, Gender::Unknown)[0], DRAMA);
        assert_eq!(select_genres(Emotion::Unknown, 29, Gender::Unknown)[0], ACTION);
        assert_eq!(select_genres(Emotion::Unknown, 30, Gender::Unknown)[0], DRAMA);
    }

    #[test]
    fn test_never_empty_and_capped() {
        for emotion in [
            Emotion::Angry,
            Emotion::Disgust,
            Emotion::Fear,
            Emotion::Happy,
            Emotion::Neutral,
            Emotion::Sad,
            Emotion::Surprise,
            Emotion::Unknown,
        ] {
            for age in [0, 5, 13, 20, 30, 72] {
                let genres = select_genres(emotion, age, Gender::Unknown);
                assert!(!genres.is_empty());
                assert!(genres.len() <= MAX_GENRES);
            }
        }
    }

    #[test]
    fn test_gender_does_not_influence_mapping() {
        for gender in [Gender::Male, Gender::Female, Gender::Unknown] {
            assert_eq!(
                select_genres(Emotion::Surprise, 45, gender),
                vec![ADVENTURE, SCIENCE_FICTION]
            );
        }
    }
}
