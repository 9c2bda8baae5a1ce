use approx::assert_relative_eq;
use car_configurator::{
    camera::ViewPreset,
    catalog::MaterialCatalog,
    command::{Command, Effect},
    data_structures::{instance::Instance, model::MeshGeometry, scene_graph::LoadedModel},
    garage::{CarChoice, CarSource},
    launch::{AppVariant, Cli, LaunchOptions},
    material::{Color, Material},
    motion::DriveInput,
    parts::{PartCategory, classify},
    resources::procedural::build_car,
    session::{LoadError, LoadState, Session},
    share::ShareConfig,
};
use cgmath::{InnerSpace, Vector3};
use clap::Parser;
use instant::Duration;

const KIA_MESHES: [&str; 9] = [
    "Body_Paint_01",
    "body_chassis_01",
    "Wheel_FL",
    "Rim_FL",
    "wheel_rim_FR",
    "body_glass_trim",
    "Windshield",
    "Headlight_L",
    "Interior_Seats",
];

fn loaded(car: CarChoice, names: &[&str]) -> LoadedModel {
    let mut loaded = LoadedModel::new(car);
    for name in names {
        loaded.push(name, MeshGeometry::default(), Material::named(name), Instance::new());
    }
    loaded
}

fn ready_configurator() -> Session {
    let mut session = Session::new(&LaunchOptions::default());
    let ticket = match session.apply(Command::SelectCar(CarChoice::Kia)) {
        Effect::Load { ticket, .. } => ticket,
        other => panic!("expected a load, got {:?}", other),
    };
    session.complete_load(ticket, loaded(CarChoice::Kia, &KIA_MESHES)).unwrap();
    session
}

fn bucket_meshes(session: &Session, category: PartCategory) -> Vec<usize> {
    session.classification().bucket(category).to_vec()
}

#[test]
fn names_land_in_expected_buckets() {
    assert_eq!(classify("body_chassis_01"), PartCategory::CarBody);
    assert_eq!(classify("body_glass_trim"), PartCategory::Glass);
    assert_eq!(classify("front_bodypanel_glass_2"), PartCategory::Glass);
    assert_eq!(classify("wheel_rim_FR"), PartCategory::Rims);
    assert_eq!(classify("Interior_Seats"), PartCategory::Other);

    let session = ready_configurator();
    assert_eq!(
        session.available_parts(),
        vec![
            PartCategory::CarBody,
            PartCategory::Wheels,
            PartCategory::Rims,
            PartCategory::Glass,
            PartCategory::Headlights,
            PartCategory::Other,
        ]
    );
    assert_eq!(bucket_meshes(&session, PartCategory::CarBody), vec![0, 1]);
    assert_eq!(bucket_meshes(&session, PartCategory::Glass), vec![5, 6]);
}

#[test]
fn loaded_car_gets_default_presets() {
    let session = ready_configurator();
    let model = session.model().unwrap();
    let catalog = session.catalog();
    let body = catalog.main_preset(MaterialCatalog::DEFAULT_BODY).unwrap();
    let rim = catalog.main_preset(MaterialCatalog::DEFAULT_RIM).unwrap();
    let glass = catalog.glass_preset(MaterialCatalog::DEFAULT_GLASS).unwrap();
    for idx in bucket_meshes(&session, PartCategory::CarBody) {
        assert!(model.meshes[idx].binding.shares(body));
    }
    for idx in bucket_meshes(&session, PartCategory::Rims) {
        assert!(model.meshes[idx].binding.shares(rim));
    }
    for idx in bucket_meshes(&session, PartCategory::Glass) {
        assert!(model.meshes[idx].binding.shares(glass));
    }
    // untouched buckets keep their own material
    let wheel = bucket_meshes(&session, PartCategory::Wheels)[0];
    assert!(!model.meshes[wheel].binding.is_shared());
}

#[test]
fn body_then_rim_presets_leave_glass_alone() {
    let mut session = ready_configurator();
    let glass_before: Vec<Material> = bucket_meshes(&session, PartCategory::Glass)
        .into_iter()
        .map(|idx| session.model().unwrap().meshes[idx].material().clone())
        .collect();

    session.apply(Command::SelectBodyMaterial(0));
    session.apply(Command::SelectRimMaterial(1));

    let model = session.model().unwrap();
    let catalog = session.catalog();
    for idx in bucket_meshes(&session, PartCategory::CarBody) {
        assert!(model.meshes[idx].binding.shares(catalog.main_preset(0).unwrap()));
    }
    for idx in bucket_meshes(&session, PartCategory::Rims) {
        assert!(model.meshes[idx].binding.shares(catalog.main_preset(1).unwrap()));
    }
    let glass_after: Vec<Material> = bucket_meshes(&session, PartCategory::Glass)
        .into_iter()
        .map(|idx| model.meshes[idx].material().clone())
        .collect();
    assert_eq!(glass_before, glass_after);
}

#[test]
fn recoloring_rims_touches_only_rims() {
    let mut session = ready_configurator();
    let before: Vec<Color> = session
        .model()
        .unwrap()
        .meshes
        .iter()
        .map(|mesh| mesh.material().color)
        .collect();

    session.apply(Command::SelectPart(PartCategory::Rims));
    session.apply(Command::PickColor(Color::from_hex(0x00ff00)));

    let rims = bucket_meshes(&session, PartCategory::Rims);
    let model = session.model().unwrap();
    for (idx, mesh) in model.meshes.iter().enumerate() {
        if rims.contains(&idx) {
            assert_eq!(mesh.material().color, Color::from_hex(0x00ff00));
            assert!(!mesh.binding.is_shared());
        } else {
            assert_eq!(mesh.material().color, before[idx], "mesh {} changed", mesh.name);
        }
    }
    // the shared preset itself is untouched
    let rim_preset = session.catalog().main_preset(MaterialCatalog::DEFAULT_RIM).unwrap();
    assert_ne!(rim_preset.color, Color::from_hex(0x00ff00));
}

#[test]
fn color_picker_ignores_glass() {
    let mut session = ready_configurator();
    session.apply(Command::SelectPart(PartCategory::Glass));
    session.apply(Command::PickColor(Color::from_hex(0x00ff00)));
    let model = session.model().unwrap();
    for idx in bucket_meshes(&session, PartCategory::Glass) {
        assert!(model.meshes[idx].binding.is_shared());
    }
}

#[test]
fn selected_part_follows_the_new_classification() {
    let mut session = Session::new(&LaunchOptions::default());
    let ticket = session.begin_load(CarChoice::Kia);
    session
        .complete_load(ticket, loaded(CarChoice::Kia, &["wheel_fl", "rim_fl"]))
        .unwrap();
    assert_eq!(session.available_parts(), vec![PartCategory::Wheels, PartCategory::Rims]);
    assert_eq!(session.selection().part, PartCategory::Wheels);

    session.apply(Command::PickColor(Color::from_hex(0x00ff00)));
    let wheel = session.model().unwrap().meshes[0].material();
    assert_eq!(wheel.color, Color::from_hex(0x00ff00));

    // a part that exists in the next car is kept
    session.apply(Command::SelectPart(PartCategory::Rims));
    let ticket = match session.apply(Command::SelectCar(CarChoice::Audi)) {
        Effect::Load { ticket, .. } => ticket,
        other => panic!("expected a load, got {:?}", other),
    };
    session
        .complete_load(ticket, loaded(CarChoice::Audi, &KIA_MESHES))
        .unwrap();
    assert_eq!(session.selection().part, PartCategory::Rims);
}

#[test]
fn invalid_preset_index_changes_nothing() {
    let mut session = ready_configurator();
    let before = session.selection();
    assert_eq!(session.apply(Command::SelectBodyMaterial(99)), Effect::None);
    assert_eq!(session.selection(), before);
}

#[test]
fn share_round_trip() {
    let mut session = ready_configurator();
    session.apply(Command::PaintBody(Color::from_hex(0x123456)));
    session.apply(Command::SetMetalness(0.25));
    session.apply(Command::SetRoughness(0.75));

    let Effect::Share { encoded } = session.apply(Command::Share) else {
        panic!("share produced no payload");
    };
    let config = ShareConfig::decode(&encoded).unwrap();
    assert_eq!(config.car, CarChoice::Kia);
    assert_eq!(config.color, Color::from_hex(0x123456));
    assert_relative_eq!(config.metalness, 0.25);
    assert_relative_eq!(config.roughness, 0.75);

    let url = config.to_url("https://example.org", "/showroom.html").unwrap();
    let query = url.split_once('?').unwrap().1;
    let options = LaunchOptions::from_query(query);
    assert_eq!(options.config, Some(config));
}

#[test]
fn shared_config_is_applied_once_ready() {
    let config = ShareConfig {
        car: CarChoice::Porsche,
        color: Color::from_hex(0x00ff00),
        metalness: 0.1,
        roughness: 0.9,
    };
    let query = format!("app=showroom&config={}", config.encode().unwrap());
    let options = LaunchOptions::from_query(&query);
    assert_eq!(options.variant, AppVariant::Showroom);
    assert_eq!(options.car, CarChoice::Porsche);

    let mut session = Session::new(&options);
    let ticket = session.begin_load(options.car);
    session.complete_load(ticket, build_car(CarChoice::Porsche)).unwrap();

    let body = bucket_meshes(&session, PartCategory::CarBody);
    assert_eq!(body.len(), 3);
    for idx in body {
        let material = session.model().unwrap().meshes[idx].material();
        assert_eq!(material.color, Color::from_hex(0x00ff00));
        assert_relative_eq!(material.metalness, 0.1);
        assert_relative_eq!(material.roughness, 0.9);
    }
}

#[test]
fn car_far_away_is_brought_back() {
    let mut session = ready_configurator();
    session.apply(Command::SetAutoRotate(false));
    session.apply(Command::Drive(DriveInput {
        forward: true,
        ..Default::default()
    }));
    session.controls.speed = session.controls.max_speed;

    // one long frame carries the car well past the boundary
    session.update_frame(Duration::from_secs(30));
    let position = session.model().unwrap().transform.position;
    assert_eq!(position, Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(session.controls.speed, 0.0);

    session.apply(Command::Drive(DriveInput::default()));
    for _ in 0..3 {
        session.update_frame(Duration::from_millis(16));
        let position = session.model().unwrap().transform.position;
        assert_relative_eq!(position.magnitude(), 0.0);
        assert_eq!(session.controls.speed, 0.0);
    }
}

#[test]
fn repeated_recovery_stays_at_origin() {
    use car_configurator::motion::{CarControls, recover_out_of_bounds};

    let mut car = Instance::from(Vector3::new(150.0, 0.0, 150.0));
    let mut controls = CarControls::default();
    controls.speed = 12.0;
    assert!(recover_out_of_bounds(&mut car, &mut controls));
    assert_eq!(car.position, Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(controls.speed, 0.0);
    for _ in 0..3 {
        assert!(!recover_out_of_bounds(&mut car, &mut controls));
        assert_eq!(car.position, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(controls.speed, 0.0);
    }
}

#[test]
fn unknown_model_falls_back_to_default_asset() {
    let options = LaunchOptions::from_query("?model=tesla");
    assert_eq!(options.car, CarChoice::Kia);
    assert_eq!(
        options.car.source(),
        CarSource::Asset("models/kia_optima_k5.glb")
    );
    let cli = Cli::try_parse_from(["car-configurator", "--model", "audi"]).unwrap();
    let options = LaunchOptions::from(cli);
    assert_eq!(
        options.car.source(),
        CarSource::Asset("models/2018_audi_rs3_sportback.glb")
    );
}

#[test]
fn stale_load_is_discarded() {
    let mut session = Session::new(&LaunchOptions::default());
    let first = session.begin_load(CarChoice::Kia);
    let second = match session.apply(Command::SelectCar(CarChoice::Audi)) {
        Effect::Load { car, ticket } => {
            assert_eq!(car, CarChoice::Audi);
            ticket
        }
        other => panic!("expected a load, got {:?}", other),
    };
    assert!(!session.is_current(first));

    let stale = session.complete_load(first, loaded(CarChoice::Kia, &KIA_MESHES));
    assert_eq!(
        stale,
        Err(LoadError::Stale {
            ticket: first,
            current: Some(second)
        })
    );
    assert!(session.model().is_none());
    assert_eq!(session.state(), LoadState::Loading { ticket: second });

    session
        .complete_load(second, loaded(CarChoice::Audi, &["body"]))
        .unwrap();
    assert_eq!(session.model().unwrap().car, CarChoice::Audi);
}

#[test]
fn showroom_only_offers_its_lineup() {
    let mut session = Session::new(&LaunchOptions::from_pairs([("app", "showroom")]));
    assert_eq!(session.apply(Command::SelectCar(CarChoice::Kia)), Effect::None);
    assert!(matches!(
        session.apply(Command::SelectCar(CarChoice::McLaren)),
        Effect::Load {
            car: CarChoice::McLaren,
            ..
        }
    ));
}

#[test]
fn camera_views_keep_distance() {
    let mut session = ready_configurator();
    session.apply(Command::Zoom(8.0));
    session.apply(Command::SetCameraView(ViewPreset::Top));
    assert_relative_eq!(session.camera.distance(), 8.0, epsilon = 1e-4);
}
