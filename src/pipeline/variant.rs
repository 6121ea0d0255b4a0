//! Pipeline variants and their stage lists.
//!
//! Each CLI entry point maps to one variant; a variant validates its
//! inputs up front and then expands into an ordered list of stage
//! descriptors with the inter-stage path wiring baked in.

use crate::config::DetectionConfig;
use crate::error::{InputRole, PipelineError, Result};
use crate::pipeline::layout::{OutputLayout, ALIGNMENT_CSV};
use crate::pipeline::stage::{BindMount, StageSpec};
use crate::pipeline::survival;
use std::fs;
use std::path::{Path, PathBuf};

const TUMOR_DETECT_IMAGE: &str = "tilpipeline/tumor-detect:2.1";
const TIL_DETECT_IMAGE: &str = "tilpipeline/til-detect:2.1";
const ALIGN_IMAGE: &str = "tilpipeline/wsi-align:1.4";
const SURVIVAL_IMAGE: &str = "tilpipeline/survival-r:1.2";

/// Conventional CSV name inside the slide directory that opts the full
/// pipeline into the survival stage.
pub const SLIDES_SURVIVAL_CSV: &str = "survival.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineVariant {
    /// Detection included: tumor-detect, til-detect, align and, when the
    /// slide directory carries a survival.csv, survival.
    DetectionIncluded { slides_dir: PathBuf },
    /// Pre-existing detections, alignment only.
    AlignOnly {
        tumor_dir: PathBuf,
        til_dir: PathBuf,
    },
    /// Pre-existing detections, alignment plus survival analysis.
    AlignAndSurvive {
        tumor_dir: PathBuf,
        til_dir: PathBuf,
        survival_csv: PathBuf,
    },
}

impl PipelineVariant {
    /// Validate every declared input, fail fast with a distinct error per
    /// missing path, and canonicalize all survivors so only absolute
    /// paths ever reach command construction.
    pub fn validated(self) -> Result<Self> {
        match self {
            Self::DetectionIncluded { slides_dir } => {
                let slides_dir = require_dir(&slides_dir, InputRole::Slides)?;
                let csv = slides_dir.join(SLIDES_SURVIVAL_CSV);
                if csv.exists() {
                    survival::validate_header(&csv)?;
                }
                Ok(Self::DetectionIncluded { slides_dir })
            }
            Self::AlignOnly { tumor_dir, til_dir } => Ok(Self::AlignOnly {
                tumor_dir: require_dir(&tumor_dir, InputRole::Tumor)?,
                til_dir: require_dir(&til_dir, InputRole::Til)?,
            }),
            Self::AlignAndSurvive {
                tumor_dir,
                til_dir,
                survival_csv,
            } => {
                let tumor_dir = require_dir(&tumor_dir, InputRole::Tumor)?;
                let til_dir = require_dir(&til_dir, InputRole::Til)?;
                survival::validate_header(&survival_csv)?;
                let survival_csv = canonical(&survival_csv)?;
                Ok(Self::AlignAndSurvive {
                    tumor_dir,
                    til_dir,
                    survival_csv,
                })
            }
        }
    }

    /// Expand into the ordered stage list. Expects `validated()` ran
    /// first; stage N's output directory is wired verbatim as stage
    /// N+1's input mount.
    pub fn stages(&self, layout: &OutputLayout, detection: &DetectionConfig) -> Vec<StageSpec> {
        match self {
            Self::DetectionIncluded { slides_dir } => {
                let mut stages = vec![
                    detect_stage(
                        "tumor-detect",
                        TUMOR_DETECT_IMAGE,
                        slides_dir,
                        layout.tumor_dir(),
                        detection,
                    ),
                    detect_stage(
                        "til-detect",
                        TIL_DETECT_IMAGE,
                        slides_dir,
                        layout.til_dir(),
                        detection,
                    ),
                    align_stage(&layout.tumor_dir(), &layout.til_dir(), layout),
                ];
                let csv = slides_dir.join(SLIDES_SURVIVAL_CSV);
                if csv.is_file() {
                    stages.push(survival_stage(&csv, layout));
                }
                stages
            }
            Self::AlignOnly { tumor_dir, til_dir } => {
                vec![align_stage(tumor_dir, til_dir, layout)]
            }
            Self::AlignAndSurvive {
                tumor_dir,
                til_dir,
                survival_csv,
            } => vec![
                align_stage(tumor_dir, til_dir, layout),
                survival_stage(survival_csv, layout),
            ],
        }
    }
}

fn require_dir(path: &Path, role: InputRole) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(PipelineError::InputMissing {
            role,
            path: path.to_path_buf(),
        });
    }
    canonical(path)
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn detect_stage(
    name: &str,
    image: &str,
    slides_dir: &Path,
    output_dir: PathBuf,
    detection: &DetectionConfig,
) -> StageSpec {
    StageSpec::new(name, image, output_dir.clone())
        .bind(BindMount::read_only(slides_dir, "/data/slides"))
        .bind(BindMount::read_write(&output_dir, "/data/output"))
        .args([
            "--slides",
            "/data/slides",
            "--output",
            "/data/output",
            "--workers",
        ])
        .arg(detection.workers.to_string())
        .arg("--batch-size")
        .arg(detection.batch_size.to_string())
}

fn align_stage(tumor_dir: &Path, til_dir: &Path, layout: &OutputLayout) -> StageSpec {
    let output_dir = layout.alignment_dir();
    StageSpec::new("align", ALIGN_IMAGE, output_dir.clone())
        .bind(BindMount::read_only(tumor_dir, "/data/tumor"))
        .bind(BindMount::read_only(til_dir, "/data/til"))
        .bind(BindMount::read_write(&output_dir, "/data/output"))
        .args([
            "--tumor",
            "/data/tumor",
            "--til",
            "/data/til",
            "--output",
            "/data/output",
        ])
}

fn survival_stage(survival_csv: &Path, layout: &OutputLayout) -> StageSpec {
    let output_dir = layout.survival_dir();
    StageSpec::new("survival", SURVIVAL_IMAGE, output_dir.clone())
        .bind(BindMount::read_only(&layout.alignment_dir(), "/data/alignment"))
        .bind(BindMount::read_only(survival_csv, "/data/survival.csv"))
        .bind(BindMount::read_write(&output_dir, "/data/output"))
        .arg("--input")
        .arg(format!("/data/alignment/{ALIGNMENT_CSV}"))
        .args([
            "--survival",
            "/data/survival.csv",
            "--output",
            "/data/output",
            "--time-column",
            survival::SURVIVAL_TIME_COLUMN,
            "--censor-column",
            survival::CENSOR_COLUMN,
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::AccessMode;
    use std::fs;
    use tempfile::TempDir;

    fn layout(dir: &TempDir) -> OutputLayout {
        OutputLayout::create(&dir.path().join("out")).unwrap()
    }

    #[test]
    fn test_align_only_stage_list() {
        let dir = TempDir::new().unwrap();
        let tumor = dir.path().join("tumor");
        let til = dir.path().join("til");
        fs::create_dir_all(&tumor).unwrap();
        fs::create_dir_all(&til).unwrap();

        let variant = PipelineVariant::AlignOnly {
            tumor_dir: tumor,
            til_dir: til,
        }
        .validated()
        .unwrap();
        let stages = variant.stages(&layout(&dir), &DetectionConfig::default());

        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].name, "align");
        assert!(stages.iter().all(|s| s.required));
    }

    #[test]
    fn test_full_pipeline_stage_order() {
        let dir = TempDir::new().unwrap();
        let slides = dir.path().join("slides");
        fs::create_dir_all(&slides).unwrap();

        let variant = PipelineVariant::DetectionIncluded { slides_dir: slides }
            .validated()
            .unwrap();
        let stages = variant.stages(&layout(&dir), &DetectionConfig::default());

        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["tumor-detect", "til-detect", "align"]);
    }

    #[test]
    fn test_full_pipeline_picks_up_survival_csv() {
        let dir = TempDir::new().unwrap();
        let slides = dir.path().join("slides");
        fs::create_dir_all(&slides).unwrap();
        fs::write(
            slides.join(SLIDES_SURVIVAL_CSV),
            "slideID,survivalA,censorA.0yes.1no\n001,1448,0\n",
        )
        .unwrap();

        let variant = PipelineVariant::DetectionIncluded { slides_dir: slides }
            .validated()
            .unwrap();
        let stages = variant.stages(&layout(&dir), &DetectionConfig::default());

        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["tumor-detect", "til-detect", "align", "survival"]
        );
    }

    #[test]
    fn test_full_pipeline_rejects_malformed_survival_csv() {
        let dir = TempDir::new().unwrap();
        let slides = dir.path().join("slides");
        fs::create_dir_all(&slides).unwrap();
        fs::write(slides.join(SLIDES_SURVIVAL_CSV), "id,days,event\n").unwrap();

        let result = PipelineVariant::DetectionIncluded { slides_dir: slides }.validated();
        assert!(matches!(result, Err(PipelineError::CsvSchema { .. })));
    }

    #[test]
    fn test_missing_tumor_dir_is_exit_5() {
        let dir = TempDir::new().unwrap();
        let til = dir.path().join("til");
        fs::create_dir_all(&til).unwrap();

        let err = PipelineVariant::AlignOnly {
            tumor_dir: dir.path().join("missing"),
            til_dir: til,
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_missing_til_dir_is_exit_6() {
        let dir = TempDir::new().unwrap();
        let tumor = dir.path().join("tumor");
        fs::create_dir_all(&tumor).unwrap();

        let err = PipelineVariant::AlignOnly {
            tumor_dir: tumor,
            til_dir: dir.path().join("missing"),
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_missing_csv_is_exit_7() {
        let dir = TempDir::new().unwrap();
        let tumor = dir.path().join("tumor");
        let til = dir.path().join("til");
        fs::create_dir_all(&tumor).unwrap();
        fs::create_dir_all(&til).unwrap();

        let err = PipelineVariant::AlignAndSurvive {
            tumor_dir: tumor,
            til_dir: til,
            survival_csv: dir.path().join("missing.csv"),
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_validation_canonicalizes_relative_paths() {
        let dir = TempDir::new().unwrap();
        let tumor = dir.path().join("tumor");
        let til = dir.path().join("til");
        fs::create_dir_all(&tumor).unwrap();
        fs::create_dir_all(&til).unwrap();

        // route through a dotted segment
        let dotted = tumor.join("..").join("tumor");
        let variant = PipelineVariant::AlignOnly {
            tumor_dir: dotted,
            til_dir: til,
        }
        .validated()
        .unwrap();

        match variant {
            PipelineVariant::AlignOnly { tumor_dir, .. } => {
                assert!(tumor_dir.is_absolute());
                assert!(!tumor_dir.to_string_lossy().contains(".."));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_detection_stage_wiring() {
        let dir = TempDir::new().unwrap();
        let slides = dir.path().join("slides");
        fs::create_dir_all(&slides).unwrap();
        let layout = layout(&dir);

        let variant = PipelineVariant::DetectionIncluded { slides_dir: slides }
            .validated()
            .unwrap();
        let detection = DetectionConfig {
            workers: 8,
            batch_size: 32,
        };
        let stages = variant.stages(&layout, &detection);

        let tumor = &stages[0];
        assert_eq!(tumor.image, TUMOR_DETECT_IMAGE);
        assert_eq!(tumor.binds[0].mode, AccessMode::ReadOnly);
        assert_eq!(tumor.binds[1].host, layout.tumor_dir());
        assert_eq!(tumor.binds[1].mode, AccessMode::ReadWrite);
        assert!(tumor.args.contains(&"8".to_string()));
        assert!(tumor.args.contains(&"32".to_string()));
    }

    #[test]
    fn test_align_consumes_detection_outputs() {
        let dir = TempDir::new().unwrap();
        let slides = dir.path().join("slides");
        fs::create_dir_all(&slides).unwrap();
        let layout = layout(&dir);

        let variant = PipelineVariant::DetectionIncluded { slides_dir: slides }
            .validated()
            .unwrap();
        let stages = variant.stages(&layout, &DetectionConfig::default());

        // the align stage must mount exactly the detection output dirs
        let align = &stages[2];
        assert_eq!(align.binds[0].host, layout.tumor_dir());
        assert_eq!(align.binds[1].host, layout.til_dir());
        assert_eq!(align.binds[2].host, layout.alignment_dir());
    }

    #[test]
    fn test_survival_consumes_alignment_output() {
        let dir = TempDir::new().unwrap();
        let tumor = dir.path().join("tumor");
        let til = dir.path().join("til");
        fs::create_dir_all(&tumor).unwrap();
        fs::create_dir_all(&til).unwrap();
        let csv = dir.path().join("survival.csv");
        fs::write(&csv, "slideID,survivalA,censorA.0yes.1no\n001,1448,0\n").unwrap();
        let layout = layout(&dir);

        let variant = PipelineVariant::AlignAndSurvive {
            tumor_dir: tumor,
            til_dir: til,
            survival_csv: csv,
        }
        .validated()
        .unwrap();
        let stages = variant.stages(&layout, &DetectionConfig::default());

        assert_eq!(stages.len(), 2);
        let survival = &stages[1];
        assert_eq!(survival.binds[0].host, layout.alignment_dir());
        assert!(survival
            .args
            .contains(&"/data/alignment/output.csv".to_string()));
        assert!(survival.args.contains(&"survivalA".to_string()));
        assert!(survival.args.contains(&"censorA.0yes.1no".to_string()));
    }
}
