use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised by theory lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TheoryError {
    #[error("scale degree must be in 0..=6, got {0}")]
    InvalidDegree(usize),

    #[error("unknown key: {0:?}")]
    InvalidKey(String),

    #[error("no key in the circle carries {sharps} sharps and {flats} flats")]
    SignatureOutOfRange { sharps: u8, flats: u8 },
}

//
// ─── KEY ───────────────────────────────────────────────────────────────────────
//

/// Number of keys on the circle.
pub const KEY_COUNT: usize = 12;

/// Number of diatonic chords in a key.
pub const DEGREE_COUNT: usize = 7;

/// Semitones from a major tonic up to its relative minor tonic.
pub const RELATIVE_MINOR_SEMITONES: usize = 9;

/// Semitones from a minor tonic up to its relative major tonic.
pub const RELATIVE_MAJOR_SEMITONES: usize = 3;

/// One of the twelve major keys, declared in clockwise circle-of-fifths order.
///
/// The discriminant is the position on the circle, so `C` is 0 and `F` is 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "Db")]
    DFlat,
    #[serde(rename = "Ab")]
    AFlat,
    #[serde(rename = "Eb")]
    EFlat,
    #[serde(rename = "Bb")]
    BFlat,
    #[serde(rename = "F")]
    F,
}

/// The circle in clockwise order.
pub const CIRCLE: [Key; KEY_COUNT] = [
    Key::C,
    Key::G,
    Key::D,
    Key::A,
    Key::E,
    Key::B,
    Key::FSharp,
    Key::DFlat,
    Key::AFlat,
    Key::EFlat,
    Key::BFlat,
    Key::F,
];

/// Direction of travel around the circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Direction::Clockwise => "clockwise",
            Direction::CounterClockwise => "counterclockwise",
        }
    }
}

impl Key {
    /// Position on the circle, 0 for C.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Key at `index` on the circle, wrapping modulo 12.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        CIRCLE[index % KEY_COUNT]
    }

    /// Enharmonic spellings, canonical spelling first.
    #[must_use]
    pub fn spellings(self) -> &'static [&'static str] {
        match self {
            Key::C => &["C"],
            Key::G => &["G"],
            Key::D => &["D"],
            Key::A => &["A"],
            Key::E => &["E"],
            Key::B => &["B", "Cb"],
            Key::FSharp => &["F#", "Gb"],
            Key::DFlat => &["Db", "C#"],
            Key::AFlat => &["Ab", "G#"],
            Key::EFlat => &["Eb", "D#"],
            Key::BFlat => &["Bb", "A#"],
            Key::F => &["F"],
        }
    }

    /// Canonical spelling.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.spellings()[0]
    }

    /// All spellings joined with `/`, e.g. `F#/Gb`.
    #[must_use]
    pub fn label(self) -> String {
        self.spellings().join("/")
    }

    /// Spelling preferred inside sharp keys.
    #[must_use]
    pub fn sharp_name(self) -> &'static str {
        self.spellings()
            .iter()
            .copied()
            .find(|s| s.contains('#'))
            .unwrap_or(self.name())
    }

    /// Pitch class of the tonic (C = 0, semitones upward).
    #[must_use]
    pub fn pitch_class(self) -> usize {
        (self.index() * 7) % KEY_COUNT
    }

    /// Key whose tonic has the given pitch class.
    #[must_use]
    pub fn from_pitch_class(pitch_class: usize) -> Self {
        // 7 is its own inverse modulo 12.
        Self::from_index((pitch_class % KEY_COUNT) * 7)
    }

    fn is_sharp_side(self) -> bool {
        self.index() <= 6
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Key {
    type Err = TheoryError;

    /// Accepts any spelling case-insensitively, or a combined `F#/Gb` label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let head = trimmed.split('/').next().unwrap_or(trimmed).trim();
        CIRCLE
            .iter()
            .copied()
            .find(|key| key.spellings().iter().any(|sp| sp.eq_ignore_ascii_case(head)))
            .ok_or_else(|| TheoryError::InvalidKey(s.to_owned()))
    }
}

/// Walk `steps` positions around the circle from `start`.
#[must_use]
pub fn steps_around(start: Key, steps: usize, direction: Direction) -> Key {
    let offset = steps % KEY_COUNT;
    match direction {
        Direction::Clockwise => Key::from_index(start.index() + offset),
        Direction::CounterClockwise => Key::from_index(start.index() + KEY_COUNT - offset),
    }
}

//
// ─── SIGNATURES ────────────────────────────────────────────────────────────────
//

/// Accidental count of a key signature. At most one side is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySignature {
    pub sharps: u8,
    pub flats: u8,
}

impl KeySignature {
    #[must_use]
    pub fn sharps(count: u8) -> Self {
        Self { sharps: count, flats: 0 }
    }

    #[must_use]
    pub fn flats(count: u8) -> Self {
        Self { sharps: 0, flats: count }
    }

    /// Human phrasing such as `3 sharps`, `1 flat`, `no sharps or flats`.
    #[must_use]
    pub fn describe(self) -> String {
        match (self.sharps, self.flats) {
            (0, 0) => "no sharps or flats".to_owned(),
            (1, 0) => "1 sharp".to_owned(),
            (n, 0) => format!("{n} sharps"),
            (0, 1) => "1 flat".to_owned(),
            (_, n) => format!("{n} flats"),
        }
    }

    /// The accidental count as a bare number, the form answers are given in.
    #[must_use]
    pub fn count(self) -> u8 {
        self.sharps.max(self.flats)
    }
}

/// Signature of a major key, derived from its circle position.
///
/// Positions 0..=6 count sharps clockwise from C; 7..=11 count flats
/// counterclockwise from C. `F#` therefore reads as six sharps.
#[must_use]
pub fn signature_count(key: Key) -> KeySignature {
    let index = key.index();
    if key.is_sharp_side() {
        KeySignature::sharps(u8::try_from(index).unwrap_or(0))
    } else {
        KeySignature::flats(u8::try_from(KEY_COUNT - index).unwrap_or(0))
    }
}

/// Major key carrying the given signature.
///
/// Six flats resolves to the `F#`/`Gb` key. Counts past the circle (seven
/// sharps, seven flats) have no key here.
///
/// # Errors
///
/// Returns `TheoryError::SignatureOutOfRange` for mixed or out-of-range counts.
pub fn key_with_signature(signature: KeySignature) -> Result<Key, TheoryError> {
    let out_of_range = TheoryError::SignatureOutOfRange {
        sharps: signature.sharps,
        flats: signature.flats,
    };
    match (signature.sharps, signature.flats) {
        (s, 0) if s <= 6 => Ok(Key::from_index(usize::from(s))),
        (0, f) if f <= 6 => Ok(Key::from_index(KEY_COUNT - usize::from(f))),
        _ => Err(out_of_range),
    }
}

//
// ─── RELATIVE KEYS ─────────────────────────────────────────────────────────────
//

/// A minor key named by its tonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinorKey {
    tonic: Key,
    spelling: &'static str,
}

impl MinorKey {
    #[must_use]
    pub fn tonic(&self) -> Key {
        self.tonic
    }

    /// Label such as `Am` or `D#m`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}m", self.spelling)
    }
}

impl fmt::Display for MinorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.spelling)
    }
}

/// Relative minor of a major key: the tonic nine semitones up.
///
/// Sharp-side majors spell the minor tonic with sharps (`F#` → `D#m`).
#[must_use]
pub fn relative_minor(major: Key) -> MinorKey {
    let tonic = Key::from_pitch_class(major.pitch_class() + RELATIVE_MINOR_SEMITONES);
    let spelling = if major.is_sharp_side() {
        tonic.sharp_name()
    } else {
        tonic.name()
    };
    MinorKey { tonic, spelling }
}

/// Relative major of the minor key whose tonic is `minor_tonic`.
#[must_use]
pub fn relative_major(minor_tonic: Key) -> Key {
    Key::from_pitch_class(minor_tonic.pitch_class() + RELATIVE_MAJOR_SEMITONES)
}

//
// ─── CHORDS ────────────────────────────────────────────────────────────────────
//

/// Triad quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
}

impl ChordQuality {
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
        }
    }
}

/// Quality by scale degree: I ii iii IV V vi vii°.
pub const DEGREE_QUALITIES: [ChordQuality; DEGREE_COUNT] = [
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Minor,
    ChordQuality::Major,
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Diminished,
];

/// Roman numerals by scale degree.
pub const ROMAN_NUMERALS: [&str; DEGREE_COUNT] = ["I", "ii", "iii", "IV", "V", "vi", "vii°"];

// Major scales in circle order, spelled with one letter per degree.
const SCALES: [[&str; DEGREE_COUNT]; KEY_COUNT] = [
    ["C", "D", "E", "F", "G", "A", "B"],
    ["G", "A", "B", "C", "D", "E", "F#"],
    ["D", "E", "F#", "G", "A", "B", "C#"],
    ["A", "B", "C#", "D", "E", "F#", "G#"],
    ["E", "F#", "G#", "A", "B", "C#", "D#"],
    ["B", "C#", "D#", "E", "F#", "G#", "A#"],
    ["F#", "G#", "A#", "B", "C#", "D#", "E#"],
    ["Db", "Eb", "F", "Gb", "Ab", "Bb", "C"],
    ["Ab", "Bb", "C", "Db", "Eb", "F", "G"],
    ["Eb", "F", "G", "Ab", "Bb", "C", "D"],
    ["Bb", "C", "D", "Eb", "F", "G", "A"],
    ["F", "G", "A", "Bb", "C", "D", "E"],
];

/// A diatonic triad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    root: &'static str,
    quality: ChordQuality,
}

impl Chord {
    #[must_use]
    pub fn root(&self) -> &'static str {
        self.root
    }

    #[must_use]
    pub fn quality(&self) -> ChordQuality {
        self.quality
    }

    /// Symbol such as `G`, `Am` or `Bdim`.
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}{}", self.root, self.quality.suffix())
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root, self.quality.suffix())
    }
}

fn check_degree(degree: usize) -> Result<(), TheoryError> {
    if degree < DEGREE_COUNT {
        Ok(())
    } else {
        Err(TheoryError::InvalidDegree(degree))
    }
}

/// Seven scale tones of a major key.
#[must_use]
pub fn scale(key: Key) -> &'static [&'static str; DEGREE_COUNT] {
    &SCALES[key.index()]
}

/// Diatonic chord built on `degree` (0 = tonic).
///
/// # Errors
///
/// Returns `TheoryError::InvalidDegree` if `degree` is outside 0..=6.
pub fn chord_at(key: Key, degree: usize) -> Result<Chord, TheoryError> {
    check_degree(degree)?;
    Ok(Chord {
        root: scale(key)[degree],
        quality: DEGREE_QUALITIES[degree],
    })
}

/// Same as [`chord_at`], with the key given by name.
///
/// # Errors
///
/// Returns `TheoryError::InvalidKey` for an unknown name and
/// `TheoryError::InvalidDegree` for a degree outside 0..=6.
pub fn chord_at_named(key: &str, degree: usize) -> Result<Chord, TheoryError> {
    chord_at(key.parse()?, degree)
}

/// All seven diatonic chords of a key, tonic first.
#[must_use]
pub fn chord_set(key: Key) -> [Chord; DEGREE_COUNT] {
    let tones = scale(key);
    std::array::from_fn(|degree| Chord {
        root: tones[degree],
        quality: DEGREE_QUALITIES[degree],
    })
}

/// Scale degree of a chord symbol within a key, matched case-insensitively.
#[must_use]
pub fn degree_of(key: Key, symbol: &str) -> Option<usize> {
    let wanted = symbol.trim();
    chord_set(key)
        .iter()
        .position(|chord| chord.symbol().eq_ignore_ascii_case(wanted))
}

/// Root, third and fifth of the triad on `degree`.
///
/// # Errors
///
/// Returns `TheoryError::InvalidDegree` if `degree` is outside 0..=6.
pub fn triad(key: Key, degree: usize) -> Result<[&'static str; 3], TheoryError> {
    check_degree(degree)?;
    let tones = scale(key);
    Ok([
        tones[degree],
        tones[(degree + 2) % DEGREE_COUNT],
        tones[(degree + 4) % DEGREE_COUNT],
    ])
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_circle_returns_to_start() {
        for key in CIRCLE {
            assert_eq!(steps_around(key, 12, Direction::Clockwise), key);
            assert_eq!(steps_around(key, 12, Direction::CounterClockwise), key);
        }
    }

    #[test]
    fn steps_wrap_in_both_directions() {
        assert_eq!(steps_around(Key::C, 1, Direction::Clockwise), Key::G);
        assert_eq!(steps_around(Key::C, 1, Direction::CounterClockwise), Key::F);
        assert_eq!(steps_around(Key::F, 2, Direction::Clockwise), Key::G);
        assert_eq!(steps_around(Key::G, 25, Direction::Clockwise), Key::D);
        assert_eq!(steps_around(Key::C, 0, Direction::Clockwise), Key::C);
    }

    #[test]
    fn relative_pairs_are_a_bijection() {
        for key in CIRCLE {
            assert_eq!(relative_major(relative_minor(key).tonic()), key);
        }
    }

    #[test]
    fn relative_minor_labels() {
        assert_eq!(relative_minor(Key::C).label(), "Am");
        assert_eq!(relative_minor(Key::G).label(), "Em");
        assert_eq!(relative_minor(Key::FSharp).label(), "D#m");
        assert_eq!(relative_minor(Key::DFlat).label(), "Bbm");
        assert_eq!(relative_minor(Key::F).label(), "Dm");
        assert_eq!(relative_major(Key::A), Key::C);
    }

    #[test]
    fn degree_qualities_hold_for_every_key() {
        for key in CIRCLE {
            let chords = chord_set(key);
            assert_eq!(chords.len(), DEGREE_COUNT);
            for (degree, chord) in chords.iter().enumerate() {
                assert_eq!(chord.quality(), DEGREE_QUALITIES[degree]);
                assert_eq!(chord_at(key, degree).unwrap(), *chord);
            }
        }
    }

    #[test]
    fn dominant_of_c_is_g() {
        assert_eq!(chord_at(Key::C, 4).unwrap().symbol(), "G");
        assert_eq!(chord_at(Key::C, 6).unwrap().symbol(), "Bdim");
        assert_eq!(chord_at_named("c", 1).unwrap().symbol(), "Dm");
    }

    #[test]
    fn chord_lookup_rejects_bad_input() {
        assert_eq!(chord_at(Key::C, 7), Err(TheoryError::InvalidDegree(7)));
        assert!(matches!(
            chord_at_named("H", 0),
            Err(TheoryError::InvalidKey(_))
        ));
    }

    #[test]
    fn signatures_follow_circle_position() {
        assert_eq!(signature_count(Key::C), KeySignature::sharps(0));
        assert_eq!(signature_count(Key::G), KeySignature::sharps(1));
        assert_eq!(signature_count(Key::F), KeySignature::flats(1));
        assert_eq!(signature_count(Key::DFlat), KeySignature::flats(5));
        assert_eq!(signature_count(Key::FSharp), KeySignature::sharps(6));
        for key in CIRCLE {
            let sig = signature_count(key);
            assert!(sig.sharps == 0 || sig.flats == 0);
            assert_eq!(key_with_signature(sig).unwrap(), key);
        }
    }

    #[test]
    fn seven_flats_is_out_of_range() {
        assert_eq!(key_with_signature(KeySignature::flats(6)).unwrap(), Key::FSharp);
        assert!(matches!(
            key_with_signature(KeySignature::flats(7)),
            Err(TheoryError::SignatureOutOfRange { .. })
        ));
        assert_eq!("Cb".parse::<Key>().unwrap(), Key::B);
    }

    #[test]
    fn keys_parse_any_spelling() {
        assert_eq!("gb".parse::<Key>().unwrap(), Key::FSharp);
        assert_eq!(" F#/Gb ".parse::<Key>().unwrap(), Key::FSharp);
        assert_eq!("c#".parse::<Key>().unwrap(), Key::DFlat);
        assert_eq!("bb".parse::<Key>().unwrap(), Key::BFlat);
        assert!("X".parse::<Key>().is_err());
    }

    #[test]
    fn triads_and_degrees() {
        assert_eq!(triad(Key::C, 0).unwrap(), ["C", "E", "G"]);
        assert_eq!(triad(Key::D, 0).unwrap(), ["D", "F#", "A"]);
        assert_eq!(triad(Key::C, 6).unwrap(), ["B", "D", "F"]);
        assert_eq!(degree_of(Key::C, "am"), Some(5));
        assert_eq!(degree_of(Key::C, "F#"), None);
    }

    #[test]
    fn pitch_classes_round_trip() {
        for key in CIRCLE {
            assert_eq!(Key::from_pitch_class(key.pitch_class()), key);
        }
        assert_eq!(Key::A.pitch_class(), 9);
    }
}
