// Takeout Archive Constants
// Naming quirks and report layout follow what Google Photos takeouts actually produce.

// Sidecars
pub const SIDECAR_EXTENSION: &str = "json";
pub const JSON_LENGTH_LIMIT: usize = 50; // Max sidecar filename length (incl. .json)
pub const JSON_TRUNCATION_MARGIN: usize = 5;

// Scopes
pub const SCOPE_FOLDER_PATTERN: &str = r"(?i)^Photos from (\d{4})$";

// Paths
pub const PROCESSED_FOLDER: &str = "processed";
pub const ORPHAN_FOLDER: &str = "orphan_json";
pub const TEMP_FILE_PREFIX: &str = ".takeout_tmp_";

// Time
pub const DEFAULT_TIME_ZONE: &str = "America/Los_Angeles";
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// Hashing
pub const HASH_CHUNK_SIZE: usize = 1_048_576; // 1MB

// Audit size band (bytes, output relative to input)
pub const SIZE_SHRINK_TOLERANCE: i64 = 32;
pub const SIZE_GROWTH_TOLERANCE: i64 = 10_240;

// Keyword separator for person names
pub const PEOPLE_SEPARATOR: &str = "; ";

// Report file suffixes (prefixed with the scope year)
pub const SKIPPED_LIST_SUFFIX: &str = "_skipped_files.txt";
pub const COPIED_ONLY_LIST_SUFFIX: &str = "_copied_only.txt";
pub const SCOPE_SUMMARY_SUFFIX: &str = "_summary.txt";
pub const RUN_SUMMARY_FILE: &str = "run_summary.txt";
pub const RUN_SUMMARY_JSON: &str = "run_summary.json";

pub const AUDIT_NOT_PRESENT_SUFFIX: &str = "_validation_result_not_present.txt";
pub const AUDIT_SIZE_MISMATCH_SUFFIX: &str = "_validation_result_size_mismatch.txt";
pub const AUDIT_INVALID_DATE_SUFFIX: &str = "_validation_result_invalid_date.txt";
pub const AUDIT_ORPHAN_SUFFIX: &str = "_validation_result_orphan_json.txt";
pub const AUDIT_ORPHAN_URL_SUFFIX: &str = "_validation_result_orphan_json_url.txt";
pub const AUDIT_SCOPE_SUMMARY_SUFFIX: &str = "_validation_summary.txt";
pub const AUDIT_SUMMARY_FILE: &str = "validation_summary.txt";
pub const AUDIT_SUMMARY_JSON: &str = "validation_summary.json";

// Resolver rule names, indexed by rule number - 1
pub const RULE_NAMES: [&str; 8] = [
    "direct",
    "truncated",
    "parenthetical",
    "-edited",
    "live photos",
    "live photos duplicates",
    "png without extension",
    "via JSON title",
];

// Live photo stills that carry the shared sidecar for their .mp4
pub const LIVE_PHOTO_STILL_EXTENSIONS: [&str; 2] = ["jpg", "heic"];

// Formats ExifTool can write metadata to. Everything else gets a timestamp-only update.
pub const WRITABLE_EXTENSIONS: [&str; 81] = [
    "360", "3g2", "3gp", "aax", "ai", "arq", "arw", "avif",
    "cr2", "cr3", "crm", "crw", "cs1", "dcp", "dng", "dr4",
    "dvb", "eps", "erf", "exif", "exv", "f4a", "f4v", "fff",
    "flif", "gif", "glv", "gpr", "hdp", "heic", "heif", "icc",
    "iiq", "ind", "insp", "jng", "jp2", "jpeg", "jpg", "jxl",
    "lrv", "m4a", "m4v", "mef", "mie", "mng", "mos", "mov",
    "mp4", "mpo", "mqv", "mrw", "nef", "nksc", "nrw", "orf",
    "ori", "pbm", "pdf", "pef", "pgm", "png", "ppm", "ps",
    "psb", "psd", "qtif", "raf", "raw", "rw2", "rwl", "sr2",
    "srw", "thm", "tif", "tiff", "vrd", "wdp", "webp", "x3f",
    "xmp",
];
