//! Shared constants for code generation and the HTTP surface.

pub const DEFAULT_PORT: u16 = 5000;

/// Candidates tried before code generation gives up.
pub const MAX_CODE_ATTEMPTS: usize = 50;

/// Zero padding of the trailing tree sequence number.
pub const TREE_SEQUENCE_WIDTH: usize = 3;

// Base code lengths per entity kind
pub const PARK_CODE_LEN: usize = 3;
pub const AREA_CODE_LEN: usize = 2;
pub const SPECIES_CODE_LEN: usize = 3;

/// Area segment used in tree codes when the tree is not inside any area.
pub const UNASSIGNED_AREA_SEGMENT: &str = "XX";

/// Padding letter for names shorter than the base code length.
pub const CODE_PAD_CHAR: char = 'X';

/// Articles and prepositions ignored when deriving codes.
pub const STOPWORDS: &[&str] = &[
    "A", "AL", "AND", "DE", "DEL", "E", "EL", "EN", "LA", "LAS", "LO", "LOS", "O", "OF", "THE",
    "U", "UN", "UNA", "Y",
];

/// Words that describe the kind of place rather than the place itself.
pub const GENERIC_WORDS: &[&str] = &[
    "AREA", "GARDEN", "JARDIN", "PARK", "PARQUE", "ZONA", "ZONE",
];

/// Header carrying the acting user's id for audit rows.
pub const USER_ID_HEADER: &str = "x-user-id";
