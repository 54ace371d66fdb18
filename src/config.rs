/// Dataset opened automatically at startup (relative to the working directory).
pub const DEFAULT_DATASET_FILE: &str = "03_TGEAPCET_2024_FinalPhase_LastRanks.xlsx";

// ---------------------------------------------------------------------------
// Rank window
// ---------------------------------------------------------------------------

/// How far below the user's rank a cutoff may lie (clamped at zero).
pub const RANK_WINDOW_BELOW: u64 = 5_000;

/// How far above the user's rank a cutoff may lie.
pub const RANK_WINDOW_ABOVE: u64 = 20_000;

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub const EXPORT_PDF_FILE_NAME: &str = "TG_EAPCET_Predictor_Results.pdf";
pub const EXPORT_PDF_MIME: &str = "application/pdf";
pub const EXPORT_CSV_FILE_NAME: &str = "TG_EAPCET_Predictor_Results.csv";
pub const EXPORT_JSON_FILE_NAME: &str = "TG_EAPCET_Predictor_Results.json";

/// Header labels are cut to this many characters (no ellipsis).
pub const HEADER_CELL_MAX_CHARS: usize = 30;

/// Body cells longer than this are shortened...
pub const BODY_CELL_MAX_CHARS: usize = 50;

/// ...to this many characters followed by `...`.
pub const BODY_CELL_KEEP_CHARS: usize = 47;

pub const REPORT_TITLE: &str = "TG EAPCET 2024 \u{2013} College Prediction";

pub const REPORT_DISCLAIMER: &str = "Note: These predictions are based on past closing ranks. \
Always verify with official counselling data.";
