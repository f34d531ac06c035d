use circles_core::error::{CirclesError, ErrorCode};
use storage::{EdgeListProvider, GraphProvider, ProviderError};
use tempfile::tempdir;

#[tokio::test]
async fn test_load_graph_from_edge_file() {
    let dir = tempdir().unwrap();
    tokio::fs::write(dir.path().join("0.edges"), "1 2\n1 3\n2 3\n3 4\n4 5\n")
        .await
        .unwrap();

    let provider = EdgeListProvider::new(dir.path());
    let graph = provider.load_graph(0).await.unwrap();

    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 5);
    assert_eq!(graph.common_neighbor_count(1, 2).unwrap(), 1);
}

#[tokio::test]
async fn test_missing_ego_is_not_found() {
    let dir = tempdir().unwrap();
    let provider = EdgeListProvider::new(dir.path());

    let err = provider.load_graph(107).await.unwrap_err();
    assert!(matches!(err, ProviderError::GraphNotFound(107)));
    assert_eq!(err.error_code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_malformed_file_reports_line() {
    let dir = tempdir().unwrap();
    tokio::fs::write(dir.path().join("3.edges"), "1 2\nnot an edge\n")
        .await
        .unwrap();

    let provider = EdgeListProvider::new(dir.path());
    match provider.load_graph(3).await {
        Err(ProviderError::MalformedEdge { line, content }) => {
            assert_eq!(line, 2);
            assert_eq!(content, "not an edge");
        }
        other => panic!("expected malformed edge, got {other:?}"),
    }
}

#[tokio::test]
async fn test_available_egos_are_sorted_and_filtered() {
    let dir = tempdir().unwrap();
    for name in ["1912.edges", "0.edges", "107.edges", "notes.txt", "abc.edges", "0.circles"] {
        tokio::fs::write(dir.path().join(name), "1 2\n").await.unwrap();
    }

    let provider = EdgeListProvider::new(dir.path());
    assert_eq!(provider.available_egos().await.unwrap(), vec![0, 107, 1912]);
}

#[tokio::test]
async fn test_available_egos_for_missing_directory() {
    let dir = tempdir().unwrap();
    let provider = EdgeListProvider::new(dir.path().join("absent"));
    assert!(provider.available_egos().await.unwrap().is_empty());
}
