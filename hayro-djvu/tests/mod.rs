//! Asset suite for hayro-djvu.
//!
//! Inputs are raw chunk payloads, listed in the `manifest_*.json` files next
//! to this crate and stored under `test-inputs`. JB2 pages are compared
//! against PNG snapshots, BZZ streams against the decompressed bytes. Run
//! with `REPLACE=1` to update the snapshots.

use std::any::Any;
use std::cmp::max;
use std::fs;
use std::panic::{AssertUnwindSafe, PanicHookInfo, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use hayro_djvu::{Bitmap, Jb2Decoder};
use image::{GrayImage, ImageFormat, Rgba, RgbaImage};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Deserialize;

const REPLACE: Option<&str> = option_env!("REPLACE");

static WORKSPACE_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")));

static SNAPSHOTS_PATH: LazyLock<PathBuf> = LazyLock::new(|| WORKSPACE_PATH.join("snapshots"));
static TEST_INPUTS_PATH: LazyLock<PathBuf> = LazyLock::new(|| WORKSPACE_PATH.join("test-inputs"));

static DIFFS_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    let path = WORKSPACE_PATH.join("diffs");
    let _ = fs::remove_dir_all(&path);
    let _ = fs::create_dir_all(&path);
    path
});

const INPUT_MANIFESTS: &[(&str, &str)] = &[
    ("jb2", "manifest_jb2.json"),
    ("bzz", "manifest_bzz.json"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Codec {
    Jb2,
    Bzz,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestEntry {
    Simple(String),
    Complex {
        id: String,
        #[serde(default)]
        path: Option<String>,
        /// The `Djbz` chunk a JB2 page inherits its symbols from.
        #[serde(default)]
        dictionary: Option<String>,
        #[serde(default = "default_render")]
        render: bool,
        #[serde(default)]
        ignore: bool,
    },
}

fn default_render() -> bool {
    true
}

impl ManifestEntry {
    fn id(&self) -> &str {
        match self {
            Self::Simple(s) => s,
            Self::Complex { id, .. } => id,
        }
    }

    fn path(&self) -> &str {
        match self {
            Self::Simple(s) => s,
            Self::Complex { path, id, .. } => path.as_deref().unwrap_or(id),
        }
    }

    fn dictionary(&self) -> Option<&str> {
        match self {
            Self::Simple(_) => None,
            Self::Complex { dictionary, .. } => dictionary.as_deref(),
        }
    }

    fn render(&self) -> bool {
        match self {
            Self::Simple(_) => true,
            Self::Complex { render, .. } => *render,
        }
    }

    fn ignore(&self) -> bool {
        match self {
            Self::Simple(_) => false,
            Self::Complex { ignore, .. } => *ignore,
        }
    }
}

struct AssetEntry {
    codec: Codec,
    input_relative_path: PathBuf,
    dictionary_relative_path: Option<PathBuf>,
    snapshot_stem: PathBuf,
    display_name: String,
    render: bool,
}

impl AssetEntry {
    fn new(namespace: &str, codec: Codec, entry: &ManifestEntry) -> Self {
        let id = entry.id();
        let display_name = format!("{namespace}/{id}");
        let input_relative_path = Path::new(namespace).join(entry.path());
        let dictionary_relative_path = entry.dictionary().map(|d| Path::new(namespace).join(d));
        let snapshot_stem = Path::new(namespace).join(id);
        Self {
            codec,
            input_relative_path,
            dictionary_relative_path,
            snapshot_stem,
            display_name,
            render: entry.render(),
        }
    }
}

struct TestReport {
    name: String,
    duration: Duration,
    outcome: Result<(), String>,
}

fn main() {
    let _panic_hook_guard = PanicHookGuard::install();
    if !run_harness() {
        std::process::exit(1);
    }
}

fn run_harness() -> bool {
    let asset_files = match collect_asset_files() {
        Ok(files) => files,
        Err(err) => {
            eprintln!("Failed to read asset directory: {err}");
            return false;
        }
    };

    if asset_files.is_empty() {
        eprintln!("No test inputs were found.");
        return false;
    }

    let progress_bar = ProgressBar::new(asset_files.len() as u64);
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner} {pos}/{len} [{elapsed_precise}] [{wide_bar}] {msg}",
        )
        .unwrap()
        .progress_chars("=>-"),
    );

    let reports: Vec<TestReport> = asset_files
        .par_iter()
        .map(|asset| {
            let name = asset.display_name.clone();
            progress_bar.set_message(name.clone());
            let start = Instant::now();
            let outcome = catch_unwind(AssertUnwindSafe(|| run_asset_test(asset))).unwrap_or_else(
                |payload| {
                    let panic_msg = describe_panic(payload.as_ref());
                    Err(format!("panic: {panic_msg}"))
                },
            );
            progress_bar.inc(1);
            TestReport {
                name,
                duration: start.elapsed(),
                outcome,
            }
        })
        .collect();

    progress_bar.finish_with_message("asset tests complete");

    println!("\nDetailed results:");
    for report in &reports {
        match &report.outcome {
            Ok(_) => println!("[PASS] {:<60} ({:.2?})", report.name, report.duration),
            Err(err) => {
                println!("[FAIL] {:<60} ({:.2?})", report.name, report.duration);
                println!("       {err}");
            }
        }
    }

    let failures: Vec<_> = reports
        .iter()
        .filter_map(|report| report.outcome.as_ref().err().map(|err| (&report.name, err)))
        .collect();

    if failures.is_empty() {
        return true;
    }

    println!(
        "\n{} of {} asset tests failed:",
        failures.len(),
        reports.len()
    );

    for (name, err) in failures {
        println!(" - {name}: {err}");
    }

    false
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_owned()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[allow(clippy::type_complexity)]
struct PanicHookGuard(Option<Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>>);

impl PanicHookGuard {
    fn install() -> Self {
        let previous = std::panic::take_hook();
        // Panics are reported per asset.
        std::panic::set_hook(Box::new(|_| {}));
        Self(Some(previous))
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.0.take() {
            std::panic::set_hook(previous);
        }
    }
}

fn collect_asset_files() -> Result<Vec<AssetEntry>, String> {
    let mut files = vec![];

    for (namespace, manifest_rel_path) in INPUT_MANIFESTS {
        let manifest_path = WORKSPACE_PATH.join(manifest_rel_path);

        if !manifest_path.exists() {
            continue;
        }

        let codec = if *namespace == "bzz" {
            Codec::Bzz
        } else {
            Codec::Jb2
        };

        let content = fs::read_to_string(&manifest_path)
            .map_err(|err| format!("failed to read manifest {}: {err}", manifest_path.display()))?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&content).map_err(|err| {
            format!(
                "failed to parse manifest {}: {err}",
                manifest_path.display()
            )
        })?;

        for entry in entries.iter().filter(|e| !e.ignore()) {
            let asset_entry = AssetEntry::new(namespace, codec, entry);

            if !TEST_INPUTS_PATH
                .join(&asset_entry.input_relative_path)
                .exists()
            {
                continue;
            }

            files.push(asset_entry);
        }
    }

    files.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(files)
}

fn read_input(relative_path: &Path) -> Result<Vec<u8>, String> {
    fs::read(TEST_INPUTS_PATH.join(relative_path))
        .map_err(|err| format!("failed to read {}: {err}", relative_path.display()))
}

fn run_asset_test(asset: &AssetEntry) -> Result<(), String> {
    let data = read_input(&asset.input_relative_path)?;

    match asset.codec {
        Codec::Jb2 => run_jb2_test(asset, &data),
        Codec::Bzz => run_bzz_test(asset, &data),
    }
}

fn run_bzz_test(asset: &AssetEntry, data: &[u8]) -> Result<(), String> {
    let decoded = hayro_djvu::decode_bzz(data).map_err(|err| format!("decode failed: {err}"))?;

    if !asset.render {
        return Ok(());
    }

    let snapshot_path = SNAPSHOTS_PATH.join(asset.snapshot_stem.with_extension("bin"));
    create_parent(&snapshot_path)?;

    if !snapshot_path.exists() {
        fs::write(&snapshot_path, &decoded)
            .map_err(|err| format!("failed to save snapshot: {err}"))?;
        return Err("new reference output was created".to_string());
    }

    let expected =
        fs::read(&snapshot_path).map_err(|err| format!("failed to load snapshot: {err}"))?;

    if expected != decoded {
        if REPLACE.is_some() {
            fs::write(&snapshot_path, &decoded)
                .map_err(|err| format!("failed to replace snapshot: {err}"))?;
            return Err("snapshot was replaced".to_string());
        }

        let first_difference = expected
            .iter()
            .zip(&decoded)
            .position(|(a, b)| a != b)
            .unwrap_or(expected.len().min(decoded.len()));

        return Err(format!(
            "output differs at byte {first_difference} (expected {} bytes, got {})",
            expected.len(),
            decoded.len()
        ));
    }

    Ok(())
}

fn run_jb2_test(asset: &AssetEntry, data: &[u8]) -> Result<(), String> {
    let asset_name = &asset.display_name;

    let dictionary_data = asset
        .dictionary_relative_path
        .as_deref()
        .map(read_input)
        .transpose()?;
    let dictionary = dictionary_data
        .as_deref()
        .map(hayro_djvu::decode_jb2_dictionary)
        .transpose()
        .map_err(|err| format!("dictionary decode failed: {err}"))?;

    let mut decoder = Jb2Decoder::new(data, dictionary.as_ref());
    decoder
        .decode()
        .map_err(|err| format!("decode failed: {err}"))?;

    if !asset.render {
        // Crash-only test.
        return Ok(());
    }

    let Some(page) = decoder.page() else {
        return Err("stream has no page".to_string());
    };
    let luma = bitmap_to_luma(page);

    let reference_path = asset.snapshot_stem.with_extension("png");
    let snapshot_path = SNAPSHOTS_PATH.join(&reference_path);
    create_parent(&snapshot_path)?;

    if !snapshot_path.exists() {
        luma.save_with_format(&snapshot_path, ImageFormat::Png)
            .map_err(|err| format!("failed to save snapshot for {asset_name}: {err}"))?;
        return Err(format!("new reference image was created for {asset_name}"));
    }

    let expected = image::open(&snapshot_path)
        .map_err(|err| format!("failed to load snapshot for {asset_name}: {err}"))?
        .into_rgba8();
    let rgba = image::DynamicImage::ImageLuma8(luma).into_rgba8();
    let (diff_image, pixel_diff) = get_diff(&expected, &rgba);

    if pixel_diff > 0 {
        let diff_path = DIFFS_PATH.join(&reference_path);
        create_parent(&diff_path)?;

        diff_image
            .save_with_format(&diff_path, ImageFormat::Png)
            .map_err(|err| format!("failed to save diff for {asset_name}: {err}"))?;

        if REPLACE.is_some() {
            rgba.save_with_format(&snapshot_path, ImageFormat::Png)
                .map_err(|err| format!("failed to replace snapshot for {asset_name}: {err}"))?;
            return Err(format!("snapshot was replaced for {asset_name}"));
        }

        return Err(format!(
            "pixel diff {pixel_diff} detected for {asset_name}"
        ));
    }

    Ok(())
}

fn create_parent(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| format!("failed to create directory: {err}"))?;
    }

    Ok(())
}

fn bitmap_to_luma(bitmap: &Bitmap) -> GrayImage {
    GrayImage::from_raw(bitmap.width(), bitmap.height(), bitmap.to_luma())
        .expect("buffer size mismatch")
}

fn get_diff(expected_image: &RgbaImage, actual_image: &RgbaImage) -> (RgbaImage, u32) {
    let width = max(expected_image.width(), actual_image.width());
    let height = max(expected_image.height(), actual_image.height());

    let mut diff_image = RgbaImage::new(width * 3, height);
    let mut pixel_diff = 0;

    for x in 0..width {
        for y in 0..height {
            let actual_pixel = get_pixel_checked(actual_image, x, y);
            let expected_pixel = get_pixel_checked(expected_image, x, y);

            match (actual_pixel, expected_pixel) {
                (Some(actual), Some(expected)) => {
                    diff_image.put_pixel(x, y, expected);
                    diff_image.put_pixel(x + width, y, diff_pixel(expected, actual));
                    diff_image.put_pixel(x + 2 * width, y, actual);

                    if expected != actual {
                        pixel_diff += 1;
                    }
                }
                (Some(actual), None) => {
                    pixel_diff += 1;
                    diff_image.put_pixel(x + width, y, Rgba([255, 0, 0, 255]));
                    diff_image.put_pixel(x + 2 * width, y, actual);
                }
                (None, Some(expected)) => {
                    pixel_diff += 1;
                    diff_image.put_pixel(x, y, expected);
                    diff_image.put_pixel(x + width, y, Rgba([255, 0, 0, 255]));
                }
                (None, None) => {}
            }
        }
    }

    (diff_image, pixel_diff)
}

fn get_pixel_checked(image: &RgbaImage, x: u32, y: u32) -> Option<Rgba<u8>> {
    (x < image.width() && y < image.height()).then(|| *image.get_pixel(x, y))
}

fn diff_pixel(expected: Rgba<u8>, actual: Rgba<u8>) -> Rgba<u8> {
    if expected != actual {
        Rgba([255, 0, 0, 255])
    } else {
        Rgba([0, 0, 0, 255])
    }
}
