// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each takes its parsed arguments plus the loaded
// configuration, applies the flag overrides, and writes its outputs to disk.

use std::path::{Path, PathBuf};

use clap::Args;
use image::Rgb;
use loupe_core::config::{ExtractConfig, LensConfig, LoupeConfig, LoupeLensConfig};
use loupe_core::error::{LoupeError, Result};
use loupe_core::types::{ImageId, ThresholdMode, ViewCategory};
use loupe_imaging::silhouette::{BatchOutcome, CategoryBuckets, SubjectImage};
use loupe_imaging::{Microscope, Raster, SilhouetteExtractor, demo_image, outline_overlay};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::report::{BatchReport, CategoryReport, ImageReport, Outcome, hash_bytes};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Threshold settings shared by `extract` and `combine`.
#[derive(Args, Debug, Clone, Default)]
pub struct ExtractOverrides {
    /// Side of the square output canvas in pixels
    #[arg(long, value_name = "PX")]
    pub canvas_size: Option<u32>,

    /// Threshold mode: "auto" (Otsu) or "adaptive"
    #[arg(long, value_name = "MODE")]
    pub threshold_mode: Option<ThresholdMode>,

    /// Treat dark regions as the subject
    #[arg(long, overrides_with = "no_invert")]
    pub invert: bool,

    /// Treat bright regions as the subject, even if the config inverts
    #[arg(long, overrides_with = "invert")]
    pub no_invert: bool,

    /// Minimum fraction of the frame the subject must cover
    #[arg(long, value_name = "RATIO")]
    pub min_area_ratio: Option<f64>,
}

impl ExtractOverrides {
    pub fn apply(&self, base: &ExtractConfig) -> ExtractConfig {
        ExtractConfig {
            canvas_size: self.canvas_size.unwrap_or(base.canvas_size),
            threshold_mode: self.threshold_mode.unwrap_or(base.threshold_mode),
            invert: self.invert_override().unwrap_or(base.invert),
            min_area_ratio: self.min_area_ratio.unwrap_or(base.min_area_ratio),
        }
    }

    /// `Some` when either inversion flag was given; the later flag wins.
    fn invert_override(&self) -> Option<bool> {
        match (self.invert, self.no_invert) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Photo to extract the silhouette from
    #[arg(long, value_name = "FILE")]
    pub image: PathBuf,

    /// Directory for the mask, overlay and source-resolution mask
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub settings: ExtractOverrides,
}

#[derive(Args, Debug, Clone)]
pub struct CombineArgs {
    /// Front-view photos
    #[arg(long, value_name = "FILE", num_args = 1..)]
    pub front: Vec<PathBuf>,

    /// Profile-view photos
    #[arg(long, value_name = "FILE", num_args = 1..)]
    pub profile: Vec<PathBuf>,

    /// Directory for the consensus masks and overlays
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Write a JSON report of every input and category
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Number of worker threads (default: one per core)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub settings: ExtractOverrides,
}

#[derive(Args, Debug, Clone)]
pub struct LensArgs {
    #[arg(long, value_name = "FILE")]
    pub image: PathBuf,

    /// Lens centre, x
    #[arg(long)]
    pub x: u32,

    /// Lens centre, y
    #[arg(long)]
    pub y: u32,

    /// Lens diameter in source pixels (50-400)
    #[arg(long, value_name = "PX")]
    pub diameter: Option<u32>,

    /// Magnification (1-8)
    #[arg(long, value_name = "FACTOR")]
    pub magnification: Option<f32>,

    /// CLAHE clip limit, 0 disables enhancement (0-10)
    #[arg(long, value_name = "LIMIT")]
    pub clip_limit: Option<f32>,

    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,
}

impl LensArgs {
    fn apply(&self, base: &LensConfig) -> LensConfig {
        LensConfig {
            diameter: self.diameter.unwrap_or(base.diameter),
            magnification: self.magnification.unwrap_or(base.magnification),
            clip_limit: self.clip_limit.unwrap_or(base.clip_limit),
            tile_grid: base.tile_grid,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LoupeArgs {
    #[arg(long, value_name = "FILE")]
    pub image: PathBuf,

    /// Loupe centre, x
    #[arg(long)]
    pub x: u32,

    /// Loupe centre, y
    #[arg(long)]
    pub y: u32,

    /// Output lens size in pixels (80-500)
    #[arg(long, value_name = "PX")]
    pub size: Option<u32>,

    /// Zoom factor (1.2-12)
    #[arg(long, value_name = "FACTOR")]
    pub zoom: Option<f32>,

    /// Equalization strength (0-1)
    #[arg(long, value_name = "AMOUNT")]
    pub strength: Option<f32>,

    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,
}

impl LoupeArgs {
    fn apply(&self, base: &LoupeLensConfig) -> LoupeLensConfig {
        LoupeLensConfig {
            size: self.size.unwrap_or(base.size),
            zoom: self.zoom.unwrap_or(base.zoom),
            strength: self.strength.unwrap_or(base.strength),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Extract one photo and write `<stem>_mask.png`, `<stem>_overlay.png` and
/// `<stem>_original_mask.png`. Returns the written paths.
#[instrument(skip_all, fields(image = %args.image.display()))]
pub fn run_extract(args: &ExtractArgs, config: &LoupeConfig) -> Result<Vec<PathBuf>> {
    let settings = args.settings.apply(&config.extract);
    let photo = Raster::open(&args.image)?.to_rgb8();
    let result = SilhouetteExtractor::new(settings).extract(&photo)?;

    std::fs::create_dir_all(&args.out_dir)?;
    let stem = file_stem(&args.image);
    let overlay = outline_overlay(
        &result.normalized_mask,
        &result.normalized_outline,
        Rgb(config.overlay.shape_color),
    );

    let outputs = vec![
        args.out_dir.join(format!("{stem}_mask.png")),
        args.out_dir.join(format!("{stem}_overlay.png")),
        args.out_dir.join(format!("{stem}_original_mask.png")),
    ];
    Raster::from_gray(result.normalized_mask).save(&outputs[0])?;
    Raster::from_rgb(overlay).save(&outputs[1])?;
    Raster::from_gray(result.original_mask).save(&outputs[2])?;

    info!(area = result.region_area, out_dir = %args.out_dir.display(), "Extraction written");
    Ok(outputs)
}

/// Extract every labelled photo, combine each view category, and write the
/// consensus masks and overlays. Per-image failures are recorded in the
/// report and do not stop the batch.
#[instrument(skip_all, fields(front = args.front.len(), profile = args.profile.len()))]
pub fn run_combine(args: &CombineArgs, config: &LoupeConfig) -> Result<BatchReport> {
    let settings = args.settings.apply(&config.extract);
    settings.validate()?;

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = args.threads {
        pool = pool.num_threads(threads);
    }
    let pool = pool
        .build()
        .map_err(|e| LoupeError::InvalidParameter(format!("failed to start worker threads: {e}")))?;

    std::fs::create_dir_all(&args.out_dir)?;
    let report = pool.install(|| combine_in_pool(args, config, settings));
    if let Some(path) = &args.report {
        report.write(path)?;
    }
    info!(
        images = report.images.len(),
        failed = report.failed_images(),
        categories = report.categories.len(),
        "Combine finished"
    );
    Ok(report)
}

fn combine_in_pool(args: &CombineArgs, config: &LoupeConfig, settings: ExtractConfig) -> BatchReport {
    let labelled: Vec<(&PathBuf, ViewCategory)> = args
        .front
        .iter()
        .map(|path| (path, ViewCategory::Front))
        .chain(args.profile.iter().map(|path| (path, ViewCategory::Profile)))
        .collect();

    let intakes: Vec<Intake> = labelled
        .par_iter()
        .map(|(path, category)| Intake::read(path, *category))
        .collect();

    // Decoded photos go to the extractor; the rest are reported as-is.
    let mut subjects = Vec::new();
    let mut slots = Vec::with_capacity(intakes.len());
    for intake in intakes {
        let slot = match intake.decoded {
            Ok(subject) => {
                subjects.push(subject);
                Ok(subjects.len() - 1)
            }
            Err(err) => Err(err),
        };
        slots.push((intake.path, intake.category, intake.sha256, slot));
    }

    let extractor = SilhouetteExtractor::new(settings.clone());
    let outcomes = extractor.extract_batch(&subjects);

    let mut report = BatchReport::new(settings);
    for (path, category, sha256, slot) in slots {
        let (id, outcome) = match slot {
            Ok(index) => image_outcome(&outcomes[index]),
            Err(err) => (None, Outcome::failed(&err)),
        };
        report.images.push(ImageReport {
            id,
            path,
            category,
            sha256,
            outcome,
        });
    }

    let buckets = CategoryBuckets::from_outcomes(&outcomes);
    for (category, combined) in buckets.combine_all() {
        let contributors = buckets.get(category).len();
        let outcome = match combined.and_then(|consensus| {
            let consensus_path = args.out_dir.join(format!("{category}_consensus.png"));
            let overlay_path = args.out_dir.join(format!("{category}_overlay.png"));
            let overlay = outline_overlay(
                &consensus.mask,
                &consensus.outline,
                Rgb(config.overlay.consensus_color),
            );
            Raster::from_gray(consensus.mask).save(&consensus_path)?;
            Raster::from_rgb(overlay).save(&overlay_path)?;
            Ok(Outcome::Ok {
                region_area: None,
                outline: consensus.outline.stats(),
                outputs: vec![consensus_path, overlay_path],
            })
        }) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%category, error = %err, "Consensus failed");
                Outcome::failed(&err)
            }
        };
        report.categories.push(CategoryReport {
            category,
            contributors,
            outcome,
        });
    }
    report
}

fn image_outcome(outcome: &BatchOutcome) -> (Option<ImageId>, Outcome) {
    let reported = match &outcome.result {
        Ok(result) => Outcome::Ok {
            region_area: Some(result.region_area),
            outline: result.normalized_outline.stats(),
            outputs: Vec::new(),
        },
        Err(err) => Outcome::failed(err),
    };
    (Some(outcome.id), reported)
}

/// A labelled input after reading and decoding.
struct Intake {
    path: PathBuf,
    category: ViewCategory,
    sha256: Option<String>,
    decoded: Result<SubjectImage>,
}

impl Intake {
    fn read(path: &Path, category: ViewCategory) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Input unreadable");
                return Self {
                    path: path.to_path_buf(),
                    category,
                    sha256: None,
                    decoded: Err(err.into()),
                };
            }
        };
        let sha256 = hash_bytes(&bytes);
        let decoded = Raster::from_bytes(&bytes)
            .map(|raster| SubjectImage::new(file_stem(path), category, raster.to_rgb8()));
        Self {
            path: path.to_path_buf(),
            category,
            sha256: Some(sha256),
            decoded,
        }
    }
}

/// Crop, enhance and magnify the area around a point.
#[instrument(skip_all, fields(image = %args.image.display(), x = args.x, y = args.y))]
pub fn run_lens(args: &LensArgs, config: &LoupeConfig) -> Result<()> {
    let photo = Raster::open(&args.image)?.to_rgb8();
    let scope = Microscope::new(args.apply(&config.lens), config.loupe.clone());
    let view = scope.inspect(&photo, (args.x, args.y))?;
    Raster::from_rgb(view.image).save(&args.out)?;
    info!(out = %args.out.display(), "Lens view written");
    Ok(())
}

/// Zoomed loupe view with blended equalization.
#[instrument(skip_all, fields(image = %args.image.display(), x = args.x, y = args.y))]
pub fn run_loupe(args: &LoupeArgs, config: &LoupeConfig) -> Result<()> {
    let photo = Raster::open(&args.image)?.to_rgb8();
    let scope = Microscope::new(config.lens.clone(), args.apply(&config.loupe));
    let view = scope.loupe(&photo, (args.x, args.y))?;
    Raster::from_rgb(view.image).save(&args.out)?;
    info!(out = %args.out.display(), "Loupe view written");
    Ok(())
}

/// Write the built-in demo subject.
pub fn run_demo(out: &Path) -> Result<()> {
    Raster::from_rgb(demo_image()).save(out)?;
    info!(out = %out.display(), "Demo image written");
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("image")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn head_photo(w: u32, h: u32) -> RgbImage {
        let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
        let (rx, ry) = (w as f64 * 0.25, h as f64 * 0.35);
        RgbImage::from_fn(w, h, |x, y| {
            let nx = (x as f64 - cx) / rx;
            let ny = (y as f64 - cy) / ry;
            if nx * nx + ny * ny <= 1.0 {
                Rgb([225, 215, 205])
            } else {
                Rgb([25, 30, 40])
            }
        })
    }

    fn write_photo(dir: &Path, name: &str, image: RgbImage) -> PathBuf {
        let path = dir.join(name);
        Raster::from_rgb(image).save(&path).unwrap();
        path
    }

    fn combine_args(dir: &Path, front: Vec<PathBuf>, profile: Vec<PathBuf>) -> CombineArgs {
        CombineArgs {
            front,
            profile,
            out_dir: dir.join("out"),
            report: Some(dir.join("report.json")),
            threads: Some(2),
            settings: ExtractOverrides::default(),
        }
    }

    #[test]
    fn overrides_take_precedence_over_config() {
        let base = ExtractConfig {
            canvas_size: 256,
            ..ExtractConfig::default()
        };
        let overrides = ExtractOverrides {
            threshold_mode: Some(ThresholdMode::Adaptive),
            invert: true,
            ..ExtractOverrides::default()
        };
        let merged = overrides.apply(&base);
        assert_eq!(merged.canvas_size, 256);
        assert_eq!(merged.threshold_mode, ThresholdMode::Adaptive);
        assert!(merged.invert);
        assert_eq!(merged.min_area_ratio, base.min_area_ratio);
    }

    #[test]
    fn no_invert_switches_off_config_inversion() {
        let base = ExtractConfig {
            invert: true,
            ..ExtractConfig::default()
        };
        assert!(ExtractOverrides::default().apply(&base).invert);

        let overrides = ExtractOverrides {
            no_invert: true,
            ..ExtractOverrides::default()
        };
        assert!(!overrides.apply(&base).invert);
    }

    #[test]
    fn extract_writes_three_images() {
        let dir = tempfile::tempdir().unwrap();
        let photo = write_photo(dir.path(), "subject.png", head_photo(160, 200));
        let args = ExtractArgs {
            image: photo,
            out_dir: dir.path().join("out"),
            settings: ExtractOverrides {
                canvas_size: Some(128),
                ..ExtractOverrides::default()
            },
        };

        let outputs = run_extract(&args, &LoupeConfig::default()).unwrap();
        assert!(outputs[0].ends_with("subject_mask.png"));
        assert!(outputs[1].ends_with("subject_overlay.png"));
        assert!(outputs[2].ends_with("subject_original_mask.png"));

        let mask = Raster::open(&outputs[0]).unwrap();
        assert_eq!((mask.width(), mask.height()), (128, 128));
        let original = Raster::open(&outputs[2]).unwrap();
        assert_eq!((original.width(), original.height()), (160, 200));
    }

    #[test]
    fn extract_fails_on_blank_photo() {
        let dir = tempfile::tempdir().unwrap();
        let photo = write_photo(dir.path(), "blank.png", RgbImage::new(64, 64));
        let args = ExtractArgs {
            image: photo,
            out_dir: dir.path().join("out"),
            settings: ExtractOverrides::default(),
        };
        assert!(matches!(
            run_extract(&args, &LoupeConfig::default()),
            Err(LoupeError::NoShapeFound)
        ));
    }

    #[test]
    fn combine_reports_failures_and_writes_consensus() {
        let dir = tempfile::tempdir().unwrap();
        let front = vec![
            write_photo(dir.path(), "f1.png", head_photo(160, 200)),
            write_photo(dir.path(), "blank.png", RgbImage::new(80, 80)),
            write_photo(dir.path(), "f2.png", head_photo(150, 210)),
        ];
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"not an image").unwrap();
        let profile = vec![broken, dir.path().join("missing.png")];

        let args = combine_args(dir.path(), front, profile);
        let report = run_combine(&args, &LoupeConfig::default()).unwrap();

        let names: Vec<String> = report.images.iter().map(|i| file_stem(&i.path)).collect();
        assert_eq!(names, ["f1", "blank", "f2", "broken", "missing"]);
        assert!(report.images[0].outcome.is_ok());
        assert!(!report.images[1].outcome.is_ok());
        assert!(report.images[2].outcome.is_ok());
        assert!(report.images[3].sha256.is_some());
        assert!(report.images[3].id.is_none());
        assert!(report.images[4].sha256.is_none());
        assert_eq!(report.failed_images(), 3);

        // Only the front view had usable masks.
        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].category, ViewCategory::Front);
        assert_eq!(report.categories[0].contributors, 2);
        assert!(report.categories[0].outcome.is_ok());

        let consensus = Raster::open(args.out_dir.join("front_consensus.png")).unwrap();
        assert_eq!((consensus.width(), consensus.height()), (512, 512));
        assert!(args.out_dir.join("front_overlay.png").exists());
        assert!(!args.out_dir.join("profile_consensus.png").exists());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("report.json")).unwrap()).unwrap();
        assert_eq!(json["images"][1]["status"], "failed");
        assert_eq!(json["categories"][0]["status"], "ok");
    }

    #[test]
    fn combine_rejects_invalid_settings_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = combine_args(dir.path(), Vec::new(), Vec::new());
        args.settings.min_area_ratio = Some(2.0);
        assert!(matches!(
            run_combine(&args, &LoupeConfig::default()),
            Err(LoupeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn lens_and_loupe_write_views() {
        let dir = tempfile::tempdir().unwrap();
        let photo = write_photo(dir.path(), "scene.png", head_photo(300, 240));

        let lens = LensArgs {
            image: photo.clone(),
            x: 150,
            y: 120,
            diameter: Some(100),
            magnification: Some(2.0),
            clip_limit: None,
            out: dir.path().join("lens.png"),
        };
        run_lens(&lens, &LoupeConfig::default()).unwrap();
        let view = Raster::open(&lens.out).unwrap();
        assert_eq!((view.width(), view.height()), (200, 200));

        let loupe = LoupeArgs {
            image: photo,
            x: 10,
            y: 10,
            size: Some(120),
            zoom: None,
            strength: Some(0.0),
            out: dir.path().join("loupe.png"),
        };
        run_loupe(&loupe, &LoupeConfig::default()).unwrap();
        let view = Raster::open(&loupe.out).unwrap();
        assert_eq!((view.width(), view.height()), (120, 120));
    }

    #[test]
    fn demo_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("demo.png");
        run_demo(&out).unwrap();
        let demo = Raster::open(&out).unwrap();
        assert_eq!((demo.width(), demo.height()), (1080, 720));
    }
}
