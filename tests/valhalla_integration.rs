//! End-to-end route request against a real Valhalla server.
//!
//! Needs Docker and a directory of prebuilt Valhalla tiles covering
//! Vienna (`VALHALLA_TILES_DIR`, default `valhalla-data`). Run with
//! `cargo test -- --ignored`.

use std::env;

use testcontainers::core::{IntoContainerPort, Mount};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, ReuseDirective, TestcontainersError};

use route_guide::geo::Location;
use route_guide::route::{Costing, Units};
use route_guide::traits::RoutingProvider;
use route_guide::valhalla::{RouteRequest, ValhallaClient, ValhallaConfig};

fn valhalla_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let tiles_dir = env::var("VALHALLA_TILES_DIR").unwrap_or_else(|_| "valhalla-data".to_string());
    let tiles_dir = std::fs::canonicalize(&tiles_dir)
        .map_err(|err| TestcontainersError::other(format!("tiles dir {tiles_dir}: {err}")))?;

    let image = GenericImage::new("ghcr.io/gis-ops/docker-valhalla/valhalla", "latest")
        .with_exposed_port(8002.tcp())
        .with_mount(Mount::bind_mount(
            tiles_dir.to_string_lossy().to_string(),
            "/custom_files",
        ))
        .with_env_var("use_tiles_ignore_pbf", "True")
        .with_env_var("serve_tiles", "True")
        .with_container_name("route-guide-valhalla")
        .with_startup_timeout(std::time::Duration::from_secs(120))
        .with_reuse(ReuseDirective::Always);

    let container = image.start()?;
    let port = container.get_host_port_ipv4(8002.tcp())?;
    let base_url = format!("http://127.0.0.1:{}", port);

    Ok((container, base_url))
}

#[test]
#[ignore = "needs Docker and Valhalla tiles"]
fn valhalla_returns_walkable_route() {
    let (container, base_url) = valhalla_container().expect("start Valhalla container");
    let client = ValhallaClient::new(ValhallaConfig {
        base_url,
        timeout_secs: Some(30),
    })
    .expect("build Valhalla client");

    let request = RouteRequest::new(
        &Location::new(48.2085, 16.3721).with_label("Stephansplatz"),
        &Location::new(48.2188, 16.3925).with_label("Praterstern"),
        Costing::Pedestrian,
        Units::Kilometers,
    );

    let route = {
        let start = std::time::Instant::now();
        let mut last = client.route(&request);
        while last.is_err() && start.elapsed() < std::time::Duration::from_secs(30) {
            std::thread::sleep(std::time::Duration::from_millis(500));
            last = client.route(&request);
        }
        last.expect("route from Valhalla")
    };

    let leg = &route.legs()[0];
    assert!(leg.points().len() >= 2);
    assert!(leg.maneuvers().len() >= 2);
    assert_eq!(leg.first_inconsistent_maneuver(), None);
    assert!(leg.maneuvers().last().unwrap().kind.is_destination());
    assert!(route.total_length_meters() > 1000.0);

    drop(container);
}
