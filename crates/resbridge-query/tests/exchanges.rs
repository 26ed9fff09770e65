mod common;

use std::time::Duration;

use common::{f64s, fragmented, header, i32s, text, ScriptedServer, Step};
use resbridge_query::{
    Array, CaseId, Client, NeverCancel, PorosityModel, Query, TimeSteps,
};

#[test]
fn active_cell_property_two_steps() {
    let values: Vec<f64> = (0..2000).map(|v| f64::from(v) * 0.5).collect();
    let mut script = vec![Step::Send(header(&[2, 16_000]))];
    script.extend(fragmented(&f64s(&values), 3_001));
    let server = ScriptedServer::single(script);

    let client = Client::new(server.config()).expect("config should validate");
    let array = client
        .active_cell_property(
            CaseId::CURRENT,
            "PORO",
            PorosityModel::Matrix,
            TimeSteps::All,
            &NeverCancel,
        )
        .expect("exchange should succeed");

    assert_eq!(array.dims(), &[1000, 2]);
    assert_eq!(array.get(&[0, 0]), Some(&0.0));
    assert_eq!(array.get(&[999, 1]), Some(&999.5));
    assert_eq!(array.column(1).map(<[f64]>::len), Some(1000));

    let captured = server.finish();
    assert_eq!(captured[0].request, "GetActiveCellProperty -1 PORO Matrix");
}

#[test]
fn grid_property_three_steps() {
    let values: Vec<f64> = (0..1500).map(f64::from).collect();
    let mut script = vec![Step::Send(header(&[10, 10, 5, 3, 4_000]))];
    script.extend(fragmented(&f64s(&values), 4_096));
    let server = ScriptedServer::single(script);

    let client = Client::new(server.config()).expect("config should validate");
    let array = client
        .grid_property(
            CaseId(3),
            0,
            "SOIL",
            PorosityModel::Fracture,
            TimeSteps::Selected(vec![1, 2, 5]),
            &NeverCancel,
        )
        .expect("exchange should succeed");

    assert_eq!(array.dims(), &[10, 10, 5, 3]);
    assert_eq!(array.get(&[9, 9, 4, 0]), Some(&499.0));
    assert_eq!(array.get(&[0, 0, 0, 2]), Some(&1000.0));

    let captured = server.finish();
    assert_eq!(captured[0].request, "GetGridProperty 3 0 SOIL Fracture 0 1 4");
}

#[test]
fn empty_property_list() {
    let server = ScriptedServer::single(vec![Step::Send(header(&[8, 0]))]);
    let client = Client::new(server.config()).expect("config should validate");

    let names = client
        .property_names(CaseId::CURRENT, PorosityModel::Matrix, &NeverCancel)
        .expect("empty catalog is valid");
    assert!(names.is_empty());
    server.finish();
}

#[test]
fn property_names_catalog() {
    let mut body = header(&[2]);
    for name in ["SWAT", "DynamicNative", "PORO", "StaticNative"] {
        body.extend(text(name));
    }
    let byte_count = 8 + (4 + 13 + 4 + 12) * 2;
    let mut script = vec![Step::Send(header(&[byte_count]))];
    script.extend(fragmented(&body, 7));
    let server = ScriptedServer::single(script);

    let client = Client::new(server.config()).expect("config should validate");
    let names = client
        .property_names(CaseId(0), PorosityModel::Matrix, &NeverCancel)
        .expect("catalog should decode");
    assert_eq!(names.len(), 2);
    assert_eq!(names[1].name, "PORO");
    assert_eq!(names[1].kind, "StaticNative");
    assert_eq!(server.finish()[0].request, "GetPropertyNames 0 Matrix");
}

#[test]
fn zero_time_steps_is_an_empty_matrix() {
    let server = ScriptedServer::single(vec![Step::Send(header(&[0, 0]))]);
    let client = Client::new(server.config()).expect("config should validate");

    let array = client
        .active_cell_property(
            CaseId::CURRENT,
            "UNKNOWN",
            PorosityModel::Matrix,
            TimeSteps::All,
            &NeverCancel,
        )
        .expect("zero count is a valid empty result");
    assert!(array.is_empty());
    server.finish();
}

#[test]
fn main_grid_dimensions_from_header() {
    let server = ScriptedServer::single(vec![Step::Send(header(&[46, 112, 22]))]);
    let client = Client::new(server.config()).expect("config should validate");
    let dims = client
        .main_grid_dimensions(CaseId::CURRENT, &NeverCancel)
        .expect("dimensions should decode");
    assert_eq!((dims.i, dims.j, dims.k), (46, 112, 22));
    server.finish();
}

#[test]
fn active_cell_info_table() {
    let columns = 3u64;
    let rows = 4usize;
    let values: Vec<i32> = (0..12).collect();
    let server = ScriptedServer::single(vec![
        Step::Send(header(&[columns, (rows * 4) as u64])),
        Step::Send(i32s(&values)),
    ]);
    let client = Client::new(server.config()).expect("config should validate");
    let table = client
        .active_cell_info(CaseId::CURRENT, PorosityModel::Matrix, &NeverCancel)
        .expect("table should decode");
    assert_eq!(table.dims(), &[4, 3]);
    assert_eq!(table.column(2), Some(&[8, 9, 10, 11][..]));
    server.finish();
}

#[test]
fn same_query_twice_gives_identical_results() {
    let values: Vec<f64> = (0..300).map(|v| f64::from(v).sqrt()).collect();
    let script = vec![Step::Send(header(&[3, 2_400])), Step::Send(f64s(&values))];
    let server = ScriptedServer::start(vec![script.clone(), script]);
    let client = Client::new(server.config()).expect("config should validate");

    let run = || {
        client
            .active_cell_property(
                CaseId(1),
                "PRESSURE",
                PorosityModel::Matrix,
                TimeSteps::Selected(vec![1, 2, 3]),
                &NeverCancel,
            )
            .expect("exchange should succeed")
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);

    let captured = server.finish();
    assert_eq!(captured[0].request, captured[1].request);
}

#[test]
fn upload_active_cell_property() {
    let values: Vec<f64> = (0..50).map(f64::from).collect();
    let request = "SetActiveCellProperty -1 NEWPROP Matrix";
    let server = ScriptedServer::single(vec![
        Step::Receive(16 + values.len() * 8),
        Step::Pause(Duration::from_millis(20)),
    ]);
    let client = Client::new(server.config()).expect("config should validate");

    let array = Array::new("SetActiveCellProperty", vec![25, 2], values.clone())
        .expect("dims should match");
    let stats = client
        .set_active_cell_property(
            CaseId::CURRENT,
            "NEWPROP",
            PorosityModel::Matrix,
            TimeSteps::All,
            &array,
            &NeverCancel,
        )
        .expect("upload should be delivered");
    assert_eq!(stats.bytes, 400);

    let captured = server.finish();
    assert_eq!(captured[0].request, request);
    assert_eq!(&captured[0].received[..16], &header(&[2, 200])[..]);
    assert_eq!(&captured[0].received[16..], &f64s(&values)[..]);
}

#[test]
fn query_run_reports_raw_response() {
    let server = ScriptedServer::single(vec![
        Step::Send(header(&[2, 48])),
        Step::Send(f64s(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])),
    ]);
    let client = Client::new(server.config()).expect("config should validate");
    let response = client
        .run(
            &Query::ActiveCellCenters {
                case: CaseId::CURRENT,
                step: 1,
                porosity: PorosityModel::Matrix,
            },
            &NeverCancel,
        )
        .expect("exchange should succeed");
    assert_eq!(response.header, vec![2, 48]);
    assert_eq!(response.stats.bytes, 48);
    assert_eq!(server.finish()[0].request, "GetActiveCellCenters -1 0 Matrix");
}
