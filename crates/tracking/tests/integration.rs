//! Integration tests for the tracking views.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use common::Location;
use domain::{
    ParcelService, ParcelStatus, RecordDelivery, RecordPickup, RecordWarehouseArrival,
    RegisterParcel, StartDelivery, TransitPlan, VehicleId, WarehouseId,
};
use event_store::InMemoryEventStore;
use tracking::{CurrentParcelsView, ParcelJourneyView, Projection, ProjectionProcessor};

async fn drive_full_lifecycle(
    service: &ParcelService<InMemoryEventStore>,
) -> common::AggregateId {
    let cmd = RegisterParcel::new(
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
        Location::new(52.52, 13.405),
        NaiveDate::from_ymd_opt(2024, 3, 13).unwrap(),
        Location::new(52.56, 13.45),
        TransitPlan::direct(WarehouseId::new("WH-BER")),
    );
    let parcel_id = cmd.parcel_id;
    service.register(cmd).await.unwrap();
    service
        .record_pickup(RecordPickup::new(
            parcel_id,
            VehicleId::new("V-1"),
            Utc::now(),
        ))
        .await
        .unwrap();
    service
        .record_warehouse_arrival(RecordWarehouseArrival::new(
            parcel_id,
            WarehouseId::new("WH-BER"),
            Utc::now(),
        ))
        .await
        .unwrap();
    service
        .start_delivery(StartDelivery::new(
            parcel_id,
            VehicleId::new("V-2"),
            Utc::now(),
        ))
        .await
        .unwrap();
    service
        .record_delivery(RecordDelivery::new(
            parcel_id,
            VehicleId::new("V-2"),
            Utc::now(),
        ))
        .await
        .unwrap();
    parcel_id
}

#[tokio::test]
async fn current_view_follows_the_lifecycle_and_drops_delivered() {
    let store = InMemoryEventStore::new();
    let service = ParcelService::new(store.clone());
    let view = Arc::new(CurrentParcelsView::new());

    let cmd = RegisterParcel::new(
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
        Location::new(52.52, 13.405),
        NaiveDate::from_ymd_opt(2024, 3, 13).unwrap(),
        Location::new(52.56, 13.45),
        TransitPlan::direct(WarehouseId::new("WH-BER")),
    );
    let parcel_id = cmd.parcel_id;
    service.register(cmd).await.unwrap();
    service
        .record_pickup(RecordPickup::new(
            parcel_id,
            VehicleId::new("V-1"),
            Utc::now(),
        ))
        .await
        .unwrap();

    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Box::new(view.as_ref().clone()) as Box<dyn Projection>);
    processor.run_catch_up().await.unwrap();

    let summary = view.get(parcel_id).await.unwrap();
    assert_eq!(summary.status, ParcelStatus::TransitToWarehouse);
    assert_eq!(summary.current_vehicle, Some(VehicleId::new("V-1")));

    // Finish the journey and catch up again.
    service
        .record_warehouse_arrival(RecordWarehouseArrival::new(
            parcel_id,
            WarehouseId::new("WH-BER"),
            Utc::now(),
        ))
        .await
        .unwrap();
    service
        .start_delivery(StartDelivery::new(
            parcel_id,
            VehicleId::new("V-2"),
            Utc::now(),
        ))
        .await
        .unwrap();
    service
        .record_delivery(RecordDelivery::new(
            parcel_id,
            VehicleId::new("V-2"),
            Utc::now(),
        ))
        .await
        .unwrap();
    processor.run_catch_up().await.unwrap();

    // Delivered parcels leave the underway view.
    assert!(view.get(parcel_id).await.is_none());
    assert!(view.is_empty().await);
}

#[tokio::test]
async fn journey_view_keeps_the_whole_timeline_in_order() {
    let store = InMemoryEventStore::new();
    let service = ParcelService::new(store.clone());
    let view = Arc::new(ParcelJourneyView::new());

    let parcel_id = drive_full_lifecycle(&service).await;

    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(view.as_ref().clone()) as Box<dyn Projection>);
    processor.run_catch_up().await.unwrap();

    let journey = view.journey(parcel_id).await;
    let types: Vec<&str> = journey.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "ParcelRegistered",
            "ParcelPickedUp",
            "ParcelArrivedAtWarehouse",
            "ParcelDeliveryStarted",
            "ParcelDelivered",
        ]
    );

    // Entries carry the actors involved.
    assert_eq!(journey[1].vehicle_id, Some(VehicleId::new("V-1")));
    assert_eq!(journey[2].warehouse_id, Some(WarehouseId::new("WH-BER")));
}

#[tokio::test]
async fn rebuild_reproduces_the_same_views() {
    let store = InMemoryEventStore::new();
    let service = ParcelService::new(store.clone());
    let journey_view = Arc::new(ParcelJourneyView::new());

    let parcel_id = drive_full_lifecycle(&service).await;

    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(journey_view.as_ref().clone()) as Box<dyn Projection>);
    processor.run_catch_up().await.unwrap();
    let before = journey_view.journey(parcel_id).await.len();

    processor.rebuild_all().await.unwrap();
    let after = journey_view.journey(parcel_id).await.len();

    assert_eq!(before, 5);
    assert_eq!(before, after);
}
