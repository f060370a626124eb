//! Public API tests that need no GPU.

use blastfield::*;
use proptest::prelude::*;

#[test]
fn test_engine_options_from_json() {
    let options = EngineOptions::from_json_str(
        r#"{
            "planePadding": 20.0,
            "defaultPixelsPerMetre": 0.5,
            "maxRasterDimension": 4096,
            "encode": { "skipHidden": true }
        }"#,
    )
    .unwrap();

    assert_eq!(options.plane_padding, 20.0);
    assert_eq!(options.default_pixels_per_metre, 0.5);
    assert_eq!(options.max_raster_dimension, 4096);
    assert!(options.encode.skip_hidden);
    assert!(!options.encode.use_toe_location);
    assert_eq!(options.opacity, 1.0);
}

#[test]
fn test_bad_options_json_is_json_error() {
    let err = EngineOptions::from_json_str("{ planePadding: }").unwrap_err();
    assert!(matches!(err, AnalyticsError::JsonError(_)));
}

#[test]
fn test_builtin_model_identities() {
    let models = models::builtin_models();
    let names: Vec<_> = models.iter().map(|m| m.name().to_string()).collect();
    assert_eq!(
        names,
        ["ppv", "scaled_distance", "holmberg_persson", "powder_factor", "firing_time"]
    );

    let ppv = models[0].info();
    assert_eq!(ppv.display_name, "Peak Particle Velocity");
    assert_eq!(ppv.unit, "mm/s");
}

#[test]
fn test_model_params_layering() {
    let mut params = ModelParams::new().with("K", 1140.0).with("B", 1.6);
    params.merge(&ModelParams::new().with("K", 900.0));
    assert_eq!(params.get("K"), Some(900.0));
    assert_eq!(params.get("B"), Some(1.6));
    assert_eq!(params.get_or("missing", 3.0), 3.0);
}

#[test]
fn test_surface_with_bad_triangle_is_rejected() {
    let vertices = [DVec3::ZERO, DVec3::X, DVec3::Y];
    let result = Geometry::from_world_surface(&vertices, &[[0, 1, 7]]);
    assert!(matches!(result, Err(AnalyticsError::InvalidArgument(_))));
    assert!(Geometry::from_world_surface(&[], &[]).is_err());
}

fn utm_surface() -> impl Strategy<Value = (Vec<DVec3>, Vec<[u32; 3]>)> {
    let vertex = (-1000.0..1000.0f64, -1000.0..1000.0f64, -50.0..50.0f64)
        .prop_map(|(x, y, z)| DVec3::new(478_000.0 + x, 6_912_000.0 + y, 300.0 + z));
    prop::collection::vec(vertex, 3..40).prop_flat_map(|vertices| {
        let n = vertices.len() as u32;
        let triangle = (0..n, 0..n, 0..n).prop_map(|(a, b, c)| [a, b, c]);
        (Just(vertices), prop::collection::vec(triangle, 1..20))
    })
}

proptest! {
    #[test]
    fn prop_world_surface_recentres_without_losing_precision(
        (vertices, triangles) in utm_surface()
    ) {
        let (geometry, offset) = Geometry::from_world_surface(&vertices, &triangles).unwrap();
        prop_assert_eq!(geometry.positions.len(), vertices.len());
        prop_assert_eq!(geometry.triangle_count(), triangles.len());

        for (local, world) in geometry.positions.iter().zip(&vertices) {
            let back = offset.to_world(*local);
            prop_assert!((back - *world).abs().max_element() < 1e-3, "{back:?} vs {world:?}");
        }

        // Local bounds are centred on the offset
        let (lo, hi) = geometry.local_bounds().unwrap();
        prop_assert!((lo + hi).abs().max_element() < 1e-3);
    }
}
