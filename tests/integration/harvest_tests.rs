//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the record host and the image
//! host, and run full harvests through plain HTTP sessions.

use roster_harvest::config::{Config, DepartmentEntry, FacilityEntry};
use roster_harvest::harvester::Coordinator;
use roster_harvest::session::HttpSession;
use roster_harvest::HarvestError;
use std::collections::HashSet;
use std::path::Path;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Builds a config pointed at the mock server
fn create_test_config(server: &MockServer, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.harvest.years = vec!["22".to_string()];
    config.harvest.max_sequence = 2;
    config.harvest.workers = 2;
    config.harvest.batch_size = 4;
    config.harvest.marker_timeout_ms = 100;
    config.harvest.poll_interval_ms = 10;
    config.target.url_template = format!("{}/qr?student_id={{id}}", server.uri());
    config.target.request_timeout_secs = 5;
    config.output.directory = output_dir.display().to_string();
    config
}

fn single_department(max_sequence: u32, config: &mut Config) {
    config.harvest.max_sequence = max_sequence;
    config.facilities = vec![FacilityEntry {
        code: "01".to_string(),
        name: "Engineering".to_string(),
        departments: vec![DepartmentEntry {
            code: "01".to_string(),
            label: "CE".to_string(),
        }],
    }];
}

fn student_id(request: &Request) -> String {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == "student_id")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

fn record_page(id: &str, with_image: bool) -> String {
    let image = if with_image {
        format!(
            r#"<div class="avatar" style="background-image: url(&quot;/img/{}.jpg&quot;);"></div>"#,
            id
        )
    } else {
        String::new()
    };

    format!(
        r#"<html><body>{}
        <div class="v-data-table"><table><tbody>
            <tr><td>Name</td><td>Student {}</td></tr>
            <tr><td>Department</td><td>{}</td></tr>
        </tbody></table></div>
        </body></html>"#,
        image,
        id,
        &id[4..6]
    )
}

const EMPTY_PAGE: &str = "<html><body><div class=\"loading\">Loading...</div></body></html>";

async fn run_harvest(
    config: Config,
) -> Result<roster_harvest::output::HarvestSummary, HarvestError> {
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let client = coordinator.client().clone();

    coordinator
        .run(
            move |_| {
                let session = HttpSession::new(client.clone());
                async move { Ok(session) }
            },
            std::future::pending(),
        )
        .await
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open CSV");
    let header = reader
        .headers()
        .expect("Failed to read header")
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|row| row.expect("Bad row").iter().map(String::from).collect())
        .collect();
    (header, rows)
}

fn read_json(path: &Path) -> Vec<serde_json::Value> {
    let bytes = std::fs::read(path).expect("Failed to read JSON");
    serde_json::from_slice(&bytes).expect("Invalid JSON")
}

#[tokio::test]
async fn test_full_harvest_with_checkpoints() {
    let server = MockServer::start().await;

    // Department 03 has no student with sequence 2; sequence 1 students have pictures
    Mock::given(method("GET"))
        .and(path("/qr"))
        .respond_with(|request: &Request| {
            let id = student_id(request);
            if &id[4..6] == "03" && id.ends_with("002") {
                ResponseTemplate::new(200).set_body_string(EMPTY_PAGE)
            } else {
                ResponseTemplate::new(200).set_body_string(record_page(&id, id.ends_with("001")))
            }
        })
        .mount(&server)
        .await;

    // One picture is missing on the image host
    Mock::given(method("GET"))
        .and(path("/img/220201001.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/img/\d+\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\xFF\xD8\xFFjpeg".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let summary = run_harvest(config).await.expect("Harvest failed");

    // 1 year x 10 departments x 2 sequences
    assert_eq!(summary.planned, 20);
    assert_eq!(summary.attempted, 20);
    assert_eq!(summary.batches, 5);
    assert_eq!(summary.succeeded, 18);
    assert_eq!(summary.no_data, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.images, 9);

    // Five independent checkpoints, each self-consistent
    let mut batch_ids = HashSet::new();
    for n in 1..=5 {
        let csv_path = dir.path().join(format!("students_batch_{}.csv", n));
        let json_path = dir.path().join(format!("student_data_batch_{}.json", n));
        assert!(csv_path.exists(), "missing {}", csv_path.display());
        assert!(json_path.exists(), "missing {}", json_path.display());

        let (header, rows) = read_csv(&csv_path);
        assert_eq!(header[0], "student_id");
        for row in &rows {
            assert_eq!(row.len(), header.len());
        }

        let json = read_json(&json_path);
        assert_eq!(json.len(), rows.len());
        for value in json {
            batch_ids.insert(value["student_id"].as_str().unwrap().to_string());
        }
    }
    assert!(!dir.path().join("students_batch_6.csv").exists());

    // The final files hold the union of every batch
    let (header, rows) = read_csv(&dir.path().join("students_complete.csv"));
    assert_eq!(rows.len(), 18);
    assert!(header.contains(&"profile_picture_path".to_string()));
    assert!(header.contains(&"Name".to_string()));

    let final_json = read_json(&dir.path().join("student_data_complete.json"));
    let final_ids: HashSet<String> = final_json
        .iter()
        .map(|v| v["student_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(final_ids, batch_ids);
    assert!(!final_ids.contains("220103002"));
    assert!(!final_ids.contains("220203002"));

    // Pictures: present when served, absent on 404
    assert!(dir.path().join("images/220101001.jpg").exists());
    assert!(!dir.path().join("images/220201001.jpg").exists());
    assert!(!dir.path().join("images/220101002.jpg").exists());

    let missing = final_json
        .iter()
        .find(|v| v["student_id"] == "220201001")
        .unwrap();
    assert!(missing.get("profile_picture_path").is_none());
}

#[tokio::test]
async fn test_rerun_does_not_refetch_existing_images() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/qr"))
        .respond_with(|request: &Request| {
            let id = student_id(request);
            ResponseTemplate::new(200).set_body_string(record_page(&id, true))
        })
        .mount(&server)
        .await;

    // The existing picture must not be requested again
    Mock::given(method("GET"))
        .and(path("/img/220101001.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/220101002.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("images");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("220101001.jpg"), b"original").unwrap();

    let mut config = create_test_config(&server, dir.path());
    single_department(2, &mut config);

    let summary = run_harvest(config).await.expect("Harvest failed");

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.images, 2);
    assert_eq!(std::fs::read(images.join("220101001.jpg")).unwrap(), b"original");
    assert_eq!(std::fs::read(images.join("220101002.jpg")).unwrap(), b"new");

    server.verify().await;
}

#[tokio::test]
async fn test_timeout_in_batch_does_not_abort_siblings() {
    let server = MockServer::start().await;

    // 220101003 never renders its record table
    Mock::given(method("GET"))
        .and(path("/qr"))
        .respond_with(|request: &Request| {
            let id = student_id(request);
            if id == "220101003" {
                ResponseTemplate::new(200).set_body_string(EMPTY_PAGE)
            } else {
                ResponseTemplate::new(200).set_body_string(record_page(&id, false))
            }
        })
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server, dir.path());
    single_department(4, &mut config);

    let summary = run_harvest(config).await.expect("Harvest failed");

    assert_eq!(summary.batches, 1);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.no_data, 1);

    let (_, rows) = read_csv(&dir.path().join("students_batch_1.csv"));
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row[0] != "220101003"));
}

#[tokio::test]
async fn test_transport_failure_is_isolated() {
    let server = MockServer::start().await;

    // 220101002 hangs past the request timeout
    Mock::given(method("GET"))
        .and(path("/qr"))
        .respond_with(|request: &Request| {
            let id = student_id(request);
            let response = ResponseTemplate::new(200).set_body_string(record_page(&id, false));
            if id == "220101002" {
                response.set_delay(std::time::Duration::from_secs(3))
            } else {
                response
            }
        })
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.target.request_timeout_secs = 1;
    config.harvest.batch_size = 2;
    single_department(4, &mut config);

    let summary = run_harvest(config).await.expect("Harvest failed");

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);

    // The second batch still ran after the failure in the first
    let (_, rows) = read_csv(&dir.path().join("students_batch_2.csv"));
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_no_records_still_writes_final_files() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/qr"))
        .respond_with(ResponseTemplate::new(404).set_body_string(EMPTY_PAGE))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server, dir.path());
    single_department(3, &mut config);

    let summary = run_harvest(config).await.expect("Harvest failed");

    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.no_data, 3);
    assert!(!dir.path().join("students_batch_1.csv").exists());

    let (header, rows) = read_csv(&dir.path().join("students_complete.csv"));
    assert_eq!(header, vec!["student_id"]);
    assert!(rows.is_empty());
    assert!(read_json(&dir.path().join("student_data_complete.json")).is_empty());
}
