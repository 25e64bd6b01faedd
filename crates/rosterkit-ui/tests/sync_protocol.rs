//! Form, list and cache working together over one bus

mod common;

use common::{an_and_binh, student, valid_fields, EventLog, TestStore};
use futures::poll;
use parking_lot::Mutex;
use rosterkit_core::{
    ClassFilter, FilterCriteria, MessageBus, RosterError, RosterEvent, Status, StatusFilter,
    StudentId, ValidationError,
};
use rosterkit_ui::{FormMode, ListController, QueryCache, QueryStatus, RosterScreen, RowAction};
use std::sync::Arc;
use tokio::runtime::Handle;

async fn screen_over(store: &Arc<TestStore>) -> RosterScreen {
    let screen = RosterScreen::new(store.clone(), FilterCriteria::default(), Handle::current());
    screen.settle().await;
    screen
}

fn names(list: &ListController) -> Vec<String> {
    list.visible_rows().into_iter().map(|s| s.name).collect()
}

#[tokio::test]
async fn test_list_loads_on_mount() {
    let store = TestStore::with_records(an_and_binh());
    let screen = RosterScreen::new(store.clone(), FilterCriteria::default(), Handle::current());

    assert!(screen.list().is_loading());
    assert!(!screen.list().has_students());

    screen.settle().await;

    assert!(!screen.list().is_loading());
    assert!(screen.list().has_students());
    assert_eq!(names(screen.list()), vec!["An", "Binh"]);
    assert_eq!(store.lists(), 1);
}

#[tokio::test]
async fn test_added_triggers_exactly_one_refetch() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;
    assert_eq!(store.lists(), 1);

    let delivered = screen.bus().publish(RosterEvent::Added);
    assert_eq!(delivered, 2);
    screen.settle().await;

    assert_eq!(store.lists(), 2);
}

#[tokio::test]
async fn test_added_without_subscribers_is_a_noop() {
    let bus = MessageBus::new();
    assert_eq!(bus.publish(RosterEvent::Added), 0);
}

#[tokio::test]
async fn test_search_scenario_an_and_binh() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;

    screen.list().set_criteria(FilterCriteria {
        search_text: "an".to_string(),
        class_filter: "".parse().unwrap(),
        status_filter: "".parse().unwrap(),
    });

    let rows = screen.list().visible_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, StudentId::from("1"));
}

#[tokio::test]
async fn test_criteria_changes_do_not_call_the_store() {
    let store = TestStore::with_records(vec![
        student("1", "An", "10A1", Status::Active),
        student("2", "Binh", "11A2", Status::Inactive),
        student("3", "Thanh", "10A1", Status::Inactive),
    ]);
    let screen = screen_over(&store).await;
    let list = screen.list();

    list.set_class_filter(ClassFilter::Only("10A1".parse().unwrap()));
    assert_eq!(names(list), vec!["An", "Thanh"]);

    list.set_status_filter(StatusFilter::Only(Status::Inactive));
    assert_eq!(names(list), vec!["Thanh"]);

    list.set_search_text("zzz");
    assert!(!list.has_students());

    list.set_criteria(FilterCriteria::default());
    assert_eq!(names(list), vec!["An", "Binh", "Thanh"]);

    assert_eq!(store.lists(), 1);
}

#[tokio::test]
async fn test_create_flows_into_the_list() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;
    screen.list().set_search_text("chau");
    assert!(!screen.list().has_students());

    let form = screen.form();
    let fields = valid_fields("Chau");
    form.set_name(fields.name);
    form.set_email(fields.email);
    form.set_date_of_birth(fields.date_of_birth);
    form.set_class_name(fields.class_name);
    form.set_status(fields.status);
    form.submit().await.unwrap();
    screen.settle().await;

    assert_eq!(names(screen.list()), vec!["Chau"]);
    assert_eq!(screen.list().record_count(), 3);
    assert_eq!(store.lists(), 2);
}

#[tokio::test]
async fn test_failed_mutation_does_not_refetch() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;

    screen.form().begin_edit(&an_and_binh()[0]).unwrap();
    store.fail_mutations("Backend offline");
    assert!(screen.form().submit().await.is_err());
    screen.settle().await;

    assert_eq!(store.lists(), 1);
    assert_eq!(
        screen.form().error_message().as_deref(),
        Some("Backend offline")
    );
}

#[tokio::test]
async fn test_row_edit_reaches_the_form() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;

    screen
        .list()
        .handle_row_action(RowAction::Edit, &StudentId::from("2"))
        .unwrap();

    assert_eq!(
        screen.form().mode(),
        FormMode::Edit {
            id: StudentId::from("2")
        }
    );
    assert_eq!(screen.form().draft().name, "Binh");
    assert_eq!(store.mutations(), 0);

    screen.form().cancel();
    assert_eq!(screen.form().mode(), FormMode::Create);
    assert_eq!(store.mutations(), 0);
}

#[tokio::test]
async fn test_row_delete_goes_through_the_form() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;
    let log = EventLog::attach(screen.bus());

    screen
        .list()
        .handle_row_action(RowAction::Delete, &StudentId::from("1"))
        .unwrap();
    screen.settle().await;

    assert_eq!(store.deletes(), 1);
    assert_eq!(names(screen.list()), vec!["Binh"]);
    assert_eq!(
        screen.form().success_message().as_deref(),
        Some("Student deleted successfully!")
    );
    assert!(matches!(
        log.events().as_slice(),
        [RosterEvent::DeleteRequested(s), RosterEvent::Added] if s.id == StudentId::from("1")
    ));
}

#[tokio::test]
async fn test_row_delete_while_form_is_busy_is_reported() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;
    let form = screen.form();

    form.begin_edit(&an_and_binh()[1]).unwrap();
    form.set_name("Binh Tran");
    store.hold_mutations();
    let update = form.submit();
    tokio::pin!(update);
    assert!(poll!(&mut update).is_pending());

    screen
        .list()
        .handle_row_action(RowAction::Delete, &StudentId::from("1"))
        .unwrap();
    form.wait_idle().await;

    assert_eq!(store.deletes(), 0);
    assert_eq!(
        form.error_message().as_deref(),
        Some("Another request is still in progress")
    );

    store.release_mutations();
    update.await.unwrap();
    screen.settle().await;
    assert_eq!(store.deletes(), 0);
    assert_eq!(names(screen.list()), vec!["An", "Binh Tran"]);
}

#[tokio::test]
async fn test_row_action_on_hidden_row_is_rejected() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;
    let log = EventLog::attach(screen.bus());
    screen.list().set_search_text("an");

    let err = screen
        .list()
        .handle_row_action(RowAction::Delete, &StudentId::from("2"))
        .unwrap_err();

    assert_eq!(
        err,
        RosterError::Validation(ValidationError::UnknownRecord(StudentId::from("2")))
    );
    assert!(log.events().is_empty());
}

#[tokio::test]
async fn test_list_error_state_clears_rows() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;
    assert!(screen.list().has_students());

    store.fail_lists("Insufficient access");
    screen.bus().publish(RosterEvent::Added);
    screen.settle().await;

    let list = screen.list();
    assert_eq!(list.status(), QueryStatus::Error);
    assert!(!list.has_students());
    assert_eq!(list.record_count(), 0);
    assert_eq!(
        list.error_message().as_deref(),
        Some("Failed to load students: Insufficient access")
    );

    // Recovers on the next successful refetch
    store.clear_failures();
    screen.bus().publish(RosterEvent::Added);
    screen.settle().await;
    assert_eq!(list.status(), QueryStatus::Ready);
    assert_eq!(list.error_message(), None);
    assert_eq!(names(list), vec!["An", "Binh"]);
}

#[tokio::test]
async fn test_rows_listener_sees_each_derivation() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;

    let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    screen
        .list()
        .on_rows_changed(move |rows| sink.lock().push(rows.len()));

    screen.list().set_search_text("binh");
    screen.list().set_search_text("");
    screen.bus().publish(RosterEvent::Added);
    screen.settle().await;

    assert_eq!(*seen.lock(), vec![1, 2, 2]);
}

#[tokio::test]
async fn test_teardown_releases_subscriptions() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;
    assert_eq!(screen.bus().subscriber_count(), 2);
    assert_eq!(screen.cache().subscriber_count(), 1);

    screen.teardown();
    screen.teardown();

    assert_eq!(screen.bus().subscriber_count(), 0);
    assert_eq!(screen.cache().subscriber_count(), 0);
    assert_eq!(screen.bus().publish(RosterEvent::Added), 0);
    assert_eq!(store.lists(), 1);
}

#[tokio::test]
async fn test_dropping_a_list_unsubscribes_it() {
    let store = TestStore::with_records(an_and_binh());
    let bus = Arc::new(MessageBus::new());
    let cache = QueryCache::new(store.clone(), Handle::current());

    {
        let list = ListController::mount(bus.clone(), cache.clone(), FilterCriteria::default());
        assert_eq!(bus.subscriber_count(), 1);
        assert!(list.is_mounted());
    }

    assert_eq!(bus.subscriber_count(), 0);
    assert_eq!(cache.subscriber_count(), 0);
    cache.wait_idle().await;
}

#[tokio::test]
async fn test_unmounted_list_ignores_late_results() {
    let store = TestStore::with_records(an_and_binh());
    store.hold_lists();
    let screen = RosterScreen::new(store.clone(), FilterCriteria::default(), Handle::current());
    tokio::task::yield_now().await;

    screen.list().unmount();
    store.release_lists();
    screen.settle().await;

    assert!(screen.list().is_loading());
    assert!(!screen.list().has_students());
    assert_eq!(screen.cache().snapshot().status, QueryStatus::Ready);
}

#[tokio::test]
async fn test_second_list_reuses_the_cached_result() {
    let store = TestStore::with_records(an_and_binh());
    let bus = Arc::new(MessageBus::new());
    let cache = QueryCache::new(store.clone(), Handle::current());

    let first = ListController::mount(bus.clone(), cache.clone(), FilterCriteria::default());
    cache.wait_idle().await;
    let second = ListController::mount(bus.clone(), cache.clone(), FilterCriteria::default());

    assert_eq!(first.visible_rows(), second.visible_rows());
    assert!(!second.is_loading());
    assert_eq!(store.lists(), 1);

    // Both lists hear one Added; the refetch is shared
    bus.publish(RosterEvent::Added);
    cache.wait_idle().await;
    assert_eq!(store.lists(), 2);
}

#[tokio::test]
async fn test_export_request_carries_visible_rows_and_criteria() {
    let store = TestStore::with_records(an_and_binh());
    let screen = screen_over(&store).await;
    screen
        .list()
        .set_status_filter(StatusFilter::Only(Status::Inactive));

    let request = screen.list().export_request();

    assert_eq!(request.records.len(), 1);
    assert_eq!(request.records[0].name, "Binh");
    assert_eq!(request.criteria.status_filter, StatusFilter::Only(Status::Inactive));
    assert_eq!(request.search_label(), "any");
}
