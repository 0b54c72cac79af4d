//! Persistence and batch evaluation of patch edges
//!
//! Edges are written to a g2o-style file, loaded back, rebound to the same
//! images and compared with the originals.

use nalgebra::SMatrix;
use photoba::camera_models::PinholeCamera;
use photoba::io::{PATCH_DIM, PatchEdgeLoader};
use photoba::{
    PatchEdge, PatchEdgeConfig, PatchImages, PatchVector, Variables, linearize_edges, total_chi2,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::NamedTempFile;

mod test_utils;
use test_utils::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn scene(
    num_points: usize,
) -> Result<(Variables, Vec<PatchEdge<PinholeCamera>>), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let pyramid = linear_pyramid()?;
    let camera = stereo_camera()?;

    let mut variables = Variables::new();
    let left = variables.add_pose(random_photometric_pose(&mut rng));
    let next = variables.add_pose(random_photometric_pose(&mut rng));

    let mut edges = Vec::new();
    for i in 0..num_points {
        let point = variables.add_point(random_point(&mut rng));
        let information = SMatrix::<f64, PATCH_DIM, PATCH_DIM>::from_fn(|r, c| {
            if r == c { 1.0 + 0.1 * r as f64 } else { 0.01 }
        });
        let images = PatchImages::new(pyramid.clone(), pyramid.clone(), i % 3);

        // Alternate temporal, cross-side and self edges
        let (observation, baseline) = match i % 3 {
            0 => (next, 0.0),
            1 => (next, STEREO_BASELINE),
            _ => (left, STEREO_BASELINE),
        };
        let edge = PatchEdge::new(
            point,
            observation,
            left,
            camera,
            images,
            baseline,
            PatchEdgeConfig::default(),
        )?
        .with_parameter_id((i % 2) as i32)
        .with_measurement(PatchVector::from_fn(|k, _| (i * PATCH_DIM + k) as f64 / 7.0))
        .with_information(information);
        edges.push(edge);
    }
    Ok((variables, edges))
}

#[test]
fn test_edges_survive_file_roundtrip() -> TestResult {
    let (variables, edges) = scene(12)?;
    let entries: Vec<_> = edges.iter().map(PatchEdge::to_entry).collect();

    let file = NamedTempFile::new()?;
    PatchEdgeLoader::write(&entries, file.path())?;
    let loaded = PatchEdgeLoader::load(file.path())?;
    assert_eq!(loaded, entries);

    let pyramid = linear_pyramid()?;
    for (i, (original, entry)) in edges.iter().zip(&loaded).enumerate() {
        let rebuilt = PatchEdge::from_entry(
            entry,
            *original.camera(),
            PatchImages::new(pyramid.clone(), pyramid.clone(), i % 3),
            original.baseline(),
            PatchEdgeConfig::default(),
        )?;

        assert_eq!(rebuilt.kind(), original.kind());
        assert_eq!(rebuilt.record(), original.record());
        let information = rebuilt.information();
        assert_eq!(*information, information.transpose());
        assert_eq!(
            rebuilt.compute_residual(&variables)?,
            original.compute_residual(&variables)?
        );
    }
    Ok(())
}

#[test]
fn test_parallel_linearization_matches_sequential() -> TestResult {
    let (variables, edges) = scene(30)?;

    let batch = linearize_edges(&edges, &variables)?;
    assert_eq!(batch.len(), edges.len());
    for (edge, (residual, jacobians)) in edges.iter().zip(&batch) {
        let (expected_residual, expected_jacobians) = edge.compute_linearization(&variables)?;
        assert_eq!(*residual, expected_residual);
        assert_eq!(*jacobians, expected_jacobians);
    }

    let expected_chi2: f64 = edges
        .iter()
        .zip(&batch)
        .map(|(edge, (residual, _))| edge.chi2(residual))
        .sum();
    let chi2 = total_chi2(&edges, &variables)?;
    assert!((chi2 - expected_chi2).abs() <= 1e-9 * expected_chi2.max(1.0));
    Ok(())
}

#[test]
fn test_unknown_handle_is_reported() -> TestResult {
    let (_, edges) = scene(3)?;
    let empty = Variables::new();
    assert!(linearize_edges(&edges, &empty).is_err());
    assert!(edges[0].is_depth_positive(&empty).is_err());
    Ok(())
}
