mod common;

use std::cell::Cell;
use std::time::Duration;

use common::{CONN, MockConnector, manager, text_options};
use sql_query_manager::helpers::create_test_result_set;
use sql_query_manager::prelude::*;

fn people() -> ResultSet {
    create_test_result_set(
        &["id", "name"],
        vec![
            vec![RowValues::Int(1), RowValues::Text("A".into())],
            vec![RowValues::Int(2), RowValues::Text("B".into())],
        ],
    )
}

#[tokio::test]
async fn maps_every_row_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let connector = MockConnector::new().with_result(people());
    let qm = manager(connector.clone());
    let options = text_options().with_command_timeout(Duration::from_secs(30));

    let pairs = qm
        .select_to_objects(
            "select id, name from people",
            |row| Ok((row.read::<i32>("id")?, row.read::<String>("name")?)),
            &options,
            &[],
        )
        .await?;

    assert_eq!(pairs, vec![(1, "A".to_string()), (2, "B".to_string())]);
    let cmd = connector.last_command();
    assert_eq!(cmd.command_type, CommandType::Text);
    assert_eq!(cmd.timeout, Duration::from_secs(30));
    Ok(())
}

#[tokio::test]
async fn zero_rows_map_to_empty_vec() -> Result<(), Box<dyn std::error::Error>> {
    let connector = MockConnector::new().with_result(create_test_result_set(&["id"], vec![]));
    let qm = manager(connector);

    let ids: Vec<i64> = qm
        .select_to_objects("select id from t", |row| row.read("id"), &text_options(), &[])
        .await?;
    assert!(ids.is_empty());
    Ok(())
}

#[tokio::test]
async fn single_maps_first_row_only() -> Result<(), Box<dyn std::error::Error>> {
    let connector = MockConnector::new().with_result(people());
    let qm = manager(connector.clone());
    let calls = Cell::new(0);

    let name = qm
        .select_to_object(
            "select id, name from people",
            |row| {
                calls.set(calls.get() + 1);
                row.read::<String>("name")
            },
            &text_options(),
            &[],
        )
        .await?;

    assert_eq!(name.as_deref(), Some("A"));
    assert_eq!(calls.get(), 1);
    assert_eq!(connector.state().rows_handed_out, 1);
    Ok(())
}

#[tokio::test]
async fn single_over_zero_rows_is_none() -> Result<(), Box<dyn std::error::Error>> {
    let qm = manager(MockConnector::new());
    let row: Option<i64> = qm
        .select_to_object("select id from t", |row| row.read("id"), &text_options(), &[])
        .await?;
    assert_eq!(row, None);
    Ok(())
}

#[tokio::test]
async fn null_count_reads_as_absent() -> Result<(), Box<dyn std::error::Error>> {
    let result = create_test_result_set(&["count"], vec![vec![RowValues::Null]]);
    let qm = manager(MockConnector::new().with_result(result));

    let count = qm
        .select_to_object(
            "select count from totals",
            |row| row.read::<Option<i64>>("count"),
            &text_options(),
            &[],
        )
        .await?;
    assert_eq!(count, Some(None));
    Ok(())
}

#[tokio::test]
async fn mapping_error_stops_iteration_and_releases_connection() {
    let connector = MockConnector::new().with_result(people());
    let qm = manager(connector.clone());
    let calls = Cell::new(0);

    let err = qm
        .select_to_objects(
            "select id, name from people",
            |row| {
                calls.set(calls.get() + 1);
                row.read::<i64>("name")
            },
            &text_options(),
            &[],
        )
        .await
        .unwrap_err();

    match err {
        QueryManagerError::FieldRead(FieldReadError::Cast { field, .. }) => {
            assert_eq!(field, "name");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(calls.get(), 1);
    let state = connector.state();
    assert_eq!((state.opened, state.closed), (1, 1));
}

#[tokio::test]
async fn null_parameter_reaches_driver_as_null() -> Result<(), Box<dyn std::error::Error>> {
    let connector = MockConnector::new().with_affected(1);
    let qm = manager(connector.clone());

    qm.execute_non_query(
        "dbo.SetNote",
        &QueryOptions::default(),
        &[Parameter::new("@id", 3), Parameter::null("@note")],
    )
    .await?;

    let cmd = connector.last_command();
    assert_eq!(cmd.command_type, CommandType::StoredProcedure);
    assert_eq!(
        cmd.parameters,
        vec![
            ("id".to_string(), RowValues::Int(3)),
            ("note".to_string(), RowValues::Null),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn execute_non_query_reports_affected_rows() -> Result<(), Box<dyn std::error::Error>> {
    let connector = MockConnector::new().with_affected(4);
    let qm = manager(connector.clone());

    let affected = qm
        .execute_non_query("delete from t", &text_options(), &[])
        .await?;
    assert_eq!(affected, 4);
    let state = connector.state();
    assert_eq!((state.opened, state.closed), (1, 1));
    Ok(())
}

#[tokio::test]
async fn per_call_options_override_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let connector = MockConnector::new();
    let qm = QueryManager::with_defaults(
        connector.clone(),
        &QueryOptions::new(CONN).with_command_timeout(Duration::from_secs(90)),
    )?;

    qm.execute_non_query("dbo.Ping", &QueryOptions::default(), &[])
        .await?;
    qm.execute_non_query(
        "select 1",
        &QueryOptions::new("Server=other").with_command_type(CommandType::Text),
        &[],
    )
    .await?;

    let state = connector.state();
    assert_eq!(state.connection_strings, vec![CONN.to_string(), "Server=other".to_string()]);
    assert_eq!(state.commands[0].timeout, Duration::from_secs(90));
    assert_eq!(state.commands[0].command_type, CommandType::StoredProcedure);
    assert_eq!(state.commands[1].timeout, Duration::from_secs(90));
    assert_eq!(state.commands[1].command_type, CommandType::Text);
    Ok(())
}

#[tokio::test]
async fn missing_connection_string_fails_before_connecting() {
    let connector = MockConnector::new();
    let qm = QueryManager::new(connector.clone());

    let err = qm
        .execute_non_query("dbo.Ping", &QueryOptions::default(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, QueryManagerError::ConfigError(_)));

    let err = qm
        .execute_non_query("dbo.Ping", &QueryOptions::new("   "), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, QueryManagerError::ConfigError(_)));
    assert!(connector.state().connection_strings.is_empty());
}

#[tokio::test]
async fn bad_parameters_fail_before_connecting() {
    let connector = MockConnector::new();
    let qm = manager(connector.clone());

    let err = qm
        .execute_non_query(
            "dbo.Save",
            &QueryOptions::default(),
            &[Parameter::new("@id", 1), Parameter::new("ID", 2)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QueryManagerError::ParameterError(_)));

    let err = qm
        .execute_non_query(
            "dbo.GetUser",
            &QueryOptions::default(),
            &[Parameter::new("id = 1; DROP TABLE users; --", 1)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QueryManagerError::ParameterError(_)));
    assert_eq!(connector.state().opened, 0);
    assert!(connector.state().commands.is_empty());
}

#[tokio::test]
async fn blank_configuration_keeps_previous_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let connector = MockConnector::new();
    let qm = manager(connector.clone());

    let err = qm.configure_connection_string("").unwrap_err();
    assert!(matches!(err, QueryManagerError::ConfigError(_)));

    qm.execute_non_query("dbo.Ping", &QueryOptions::default(), &[])
        .await?;
    assert_eq!(connector.state().connection_strings, vec![CONN.to_string()]);
    Ok(())
}

#[tokio::test]
async fn connection_is_closed_when_command_fails() {
    let connector = MockConnector::new().failing_execute();
    let qm = manager(connector.clone());

    let err = qm
        .select_to_objects("select 1", |row| row.read::<i64>("x"), &text_options(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, QueryManagerError::ExecutionError(_)));
    let state = connector.state();
    assert_eq!((state.opened, state.closed), (1, 1));
}

#[tokio::test]
async fn command_error_wins_over_close_error() {
    let connector = MockConnector::new().failing_execute().failing_close();
    let qm = manager(connector.clone());

    let err = qm
        .execute_non_query("dbo.Ping", &QueryOptions::default(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, QueryManagerError::ExecutionError(_)));
}

#[tokio::test]
async fn close_error_surfaces_after_success() {
    let connector = MockConnector::new().failing_close();
    let qm = manager(connector.clone());

    let err = qm
        .execute_non_query("dbo.Ping", &QueryOptions::default(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, QueryManagerError::ConnectionError(_)));
}

#[tokio::test]
async fn open_failure_is_reported() {
    let connector = MockConnector::new().failing_open();
    let qm = manager(connector.clone());

    let err = qm
        .execute_non_query("dbo.Ping", &QueryOptions::default(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, QueryManagerError::ConnectionError(_)));
    assert_eq!(connector.state().closed, 0);
}

#[tokio::test]
async fn slow_command_times_out_and_releases_connection() {
    let connector = MockConnector::new().with_delay(Duration::from_secs(5));
    let qm = manager(connector.clone());
    let options = QueryOptions::default().with_command_timeout(Duration::from_millis(20));

    let err = qm
        .execute_non_query("dbo.Slow", &options, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, QueryManagerError::ExecutionError(ref msg) if msg.contains("timed out")));
    assert_eq!(connector.state().closed, 1);
}

#[tokio::test]
async fn zero_timeout_waits_for_completion() -> Result<(), Box<dyn std::error::Error>> {
    let connector = MockConnector::new()
        .with_delay(Duration::from_millis(20))
        .with_affected(2);
    let qm = manager(connector);
    let options = QueryOptions::default().with_command_timeout(Duration::ZERO);

    assert_eq!(qm.execute_non_query("dbo.Slow", &options, &[]).await?, 2);
    Ok(())
}

#[tokio::test]
async fn value_scalar_defaults_on_null_or_no_row() -> Result<(), Box<dyn std::error::Error>> {
    let qm = manager(MockConnector::new());
    let none: i64 = qm.select_value_scalar("select 1 where 0 = 1", &text_options(), &[]).await?;
    assert_eq!(none, 0);

    let null = create_test_result_set(&["total"], vec![vec![RowValues::Null]]);
    let qm = manager(MockConnector::new().with_result(null));
    let total: f64 = qm.select_value_scalar("select sum(x) from t", &text_options(), &[]).await?;
    assert!(total.abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn value_scalar_reads_only_the_first_row() -> Result<(), Box<dyn std::error::Error>> {
    let connector = MockConnector::new().with_result(people());
    let qm = manager(connector.clone());

    let id: i64 = qm.select_value_scalar("select id, name from people", &text_options(), &[]).await?;
    assert_eq!(id, 1);
    assert_eq!(connector.state().rows_handed_out, 1);
    Ok(())
}

#[tokio::test]
async fn value_scalar_reports_cast_failures() {
    let text = create_test_result_set(&["v"], vec![vec![RowValues::Text("abc".into())]]);
    let qm = manager(MockConnector::new().with_result(text));

    let err = qm
        .select_value_scalar::<i32>("select v from t", &text_options(), &[])
        .await
        .unwrap_err();
    match err {
        QueryManagerError::FieldRead(e) => assert_eq!(e.field_name(), "scalar"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn reference_scalar_swallows_cast_failures() -> Result<(), Box<dyn std::error::Error>> {
    let text = create_test_result_set(&["v"], vec![vec![RowValues::Text("abc".into())]]);
    let qm = manager(MockConnector::new().with_result(text));

    let as_int: Option<i64> = qm
        .select_reference_scalar("select v from t", &text_options(), &[])
        .await?;
    assert_eq!(as_int, None);

    let as_text: Option<String> = qm
        .select_reference_scalar("select v from t", &text_options(), &[])
        .await?;
    assert_eq!(as_text.as_deref(), Some("abc"));
    Ok(())
}
