//! Integration tests for job batching, transfer consolidation and the
//! progress sweep.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use common::{AggregateId, Location};
use dispatch::{
    ActiveSet, DispatchError, InMemoryNoticeBus, InMemoryRouteOptimizer, JobOrchestrator,
    ProgressGenerator, VehicleTracker,
};
use domain::{
    JobId, ParcelService, ParcelStatus, RecordPickup, RecordWarehouseArrival, RegisterParcel,
    TransitPlan, VehicleId, WarehouseId,
};
use event_store::InMemoryEventStore;
use fleet::{
    FleetStore, InMemoryFleetStore, Job, JobStatus, JobStep, Order, RouteKind, Vehicle, Warehouse,
    WarehouseStatus,
};

type Orchestrator = JobOrchestrator<
    InMemoryEventStore,
    InMemoryFleetStore,
    InMemoryRouteOptimizer,
    InMemoryNoticeBus,
>;
type Generator = ProgressGenerator<
    InMemoryEventStore,
    InMemoryFleetStore,
    InMemoryRouteOptimizer,
    InMemoryNoticeBus,
>;

struct Harness {
    fleet: InMemoryFleetStore,
    parcels: Arc<ParcelService<InMemoryEventStore>>,
    optimizer: InMemoryRouteOptimizer,
    bus: InMemoryNoticeBus,
    active: ActiveSet,
    orchestrator: Arc<Orchestrator>,
    generator: Generator,
}

fn harness() -> Harness {
    let store = InMemoryEventStore::new();
    let parcels = Arc::new(ParcelService::new(store));
    let fleet = InMemoryFleetStore::new();
    let optimizer = InMemoryRouteOptimizer::new();
    let bus = InMemoryNoticeBus::new();
    let active = ActiveSet::new();

    let orchestrator = Arc::new(JobOrchestrator::new(
        fleet.clone(),
        optimizer.clone(),
        bus.clone(),
        parcels.clone(),
        active.clone(),
    ));
    let generator = ProgressGenerator::new(
        fleet.clone(),
        parcels.clone(),
        orchestrator.clone(),
        bus.clone(),
        active.clone(),
        VehicleTracker::new(),
    );

    Harness {
        fleet,
        parcels,
        optimizer,
        bus,
        active,
        orchestrator,
        generator,
    }
}

fn warehouse(id: &str, lat: f64, lon: f64) -> Warehouse {
    Warehouse {
        id: WarehouseId::new(id),
        location: Location::new(lat, lon),
        city_codename: id.trim_start_matches("WH-").to_string(),
        range_km: Some(500.0),
        status: WarehouseStatus::Available,
    }
}

fn vehicle(id: &str, warehouse: &str, kind: RouteKind) -> Vehicle {
    Vehicle {
        id: VehicleId::new(id),
        warehouse_id: WarehouseId::new(warehouse),
        kind,
        capacity_secs: 8 * 3600,
    }
}

fn pickup_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
}

fn delivery_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()
}

/// Registers a parcel and queues its pickup order, the way the saga's
/// terminal step would.
async fn seed_parcel(
    h: &Harness,
    plan: TransitPlan,
    pickup_location: Location,
    delivery_location: Location,
) -> AggregateId {
    let cmd = RegisterParcel::new(
        pickup_date(),
        pickup_location,
        delivery_date(),
        delivery_location,
        plan.clone(),
    );
    let parcel_id = cmd.parcel_id;
    h.parcels.register(cmd).await.unwrap();

    let warehouse = h
        .fleet
        .get_warehouse(plan.first())
        .await
        .unwrap()
        .unwrap();
    h.fleet
        .put_order(Order {
            parcel_id,
            kind: RouteKind::Pickup,
            warehouse_id: warehouse.id.clone(),
            date: pickup_date(),
            location: pickup_location,
            warehouse,
        })
        .await
        .unwrap();

    parcel_id
}

fn at(y: i32, m: u32, d: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hour, min, 0).unwrap()
}

mod batching {
    use super::*;

    #[tokio::test]
    async fn pickup_orders_become_jobs_atomically() {
        let h = harness();
        h.fleet
            .put_warehouse(warehouse("WH-BER", 52.52, 13.405))
            .await
            .unwrap();
        h.fleet
            .put_vehicle(vehicle("V-1", "WH-BER", RouteKind::Pickup))
            .await
            .unwrap();
        h.fleet
            .put_vehicle(vehicle("V-2", "WH-BER", RouteKind::Pickup))
            .await
            .unwrap();

        for i in 0..3 {
            seed_parcel(
                &h,
                TransitPlan::direct(WarehouseId::new("WH-BER")),
                Location::new(52.53 + f64::from(i) * 0.01, 13.41),
                Location::new(52.60, 13.50),
            )
            .await;
        }
        assert_eq!(h.fleet.order_count().await, 3);

        let jobs = h
            .orchestrator
            .create_pickup_jobs(&WarehouseId::new("WH-BER"), pickup_date())
            .await
            .unwrap();

        // One job per used vehicle; every order consumed.
        assert_eq!(jobs.len(), 2);
        assert_eq!(h.fleet.order_count().await, 0);
        assert_eq!(h.fleet.job_count().await, 2);

        // Capacity paid for both vehicles.
        for id in ["V-1", "V-2"] {
            let v = h
                .fleet
                .get_vehicle(&VehicleId::new(id))
                .await
                .unwrap()
                .unwrap();
            assert!(v.capacity_secs < 8 * 3600);
        }

        // Vehicles entered the tracking set and the bus heard about it.
        assert_eq!(h.active.vehicles().await.len(), 2);
        let job_created = h
            .bus
            .notices()
            .iter()
            .filter(|n| matches!(n, dispatch::DispatchNotice::JobCreated { .. }))
            .count();
        assert_eq!(job_created, 2);
    }

    #[tokio::test]
    async fn no_vehicles_fails_fast() {
        let h = harness();
        h.fleet
            .put_warehouse(warehouse("WH-BER", 52.52, 13.405))
            .await
            .unwrap();
        seed_parcel(
            &h,
            TransitPlan::direct(WarehouseId::new("WH-BER")),
            Location::new(52.53, 13.41),
            Location::new(52.60, 13.50),
        )
        .await;

        let result = h
            .orchestrator
            .create_pickup_jobs(&WarehouseId::new("WH-BER"), pickup_date())
            .await;

        assert!(matches!(
            result,
            Err(DispatchError::NoVehiclesAvailable { .. })
        ));
        // The backlog is untouched for the operator to deal with.
        assert_eq!(h.fleet.order_count().await, 1);
    }

    #[tokio::test]
    async fn optimizer_failure_aborts_the_batch_cleanly() {
        let h = harness();
        h.fleet
            .put_warehouse(warehouse("WH-BER", 52.52, 13.405))
            .await
            .unwrap();
        h.fleet
            .put_vehicle(vehicle("V-1", "WH-BER", RouteKind::Pickup))
            .await
            .unwrap();
        seed_parcel(
            &h,
            TransitPlan::direct(WarehouseId::new("WH-BER")),
            Location::new(52.53, 13.41),
            Location::new(52.60, 13.50),
        )
        .await;

        h.optimizer.set_fail_on_optimize(true);

        let result = h
            .orchestrator
            .create_pickup_jobs(&WarehouseId::new("WH-BER"), pickup_date())
            .await;

        assert!(matches!(result, Err(DispatchError::Optimizer(_))));
        // Nothing was committed.
        assert_eq!(h.fleet.order_count().await, 1);
        assert_eq!(h.fleet.job_count().await, 0);
        let v = h
            .fleet
            .get_vehicle(&VehicleId::new("V-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(v.capacity_secs, 8 * 3600);
    }
}

mod transfer_consolidation {
    use super::*;

    #[tokio::test]
    async fn same_connection_same_night_coalesces_into_one_job() {
        let h = harness();
        let p1 = AggregateId::new();
        let p2 = AggregateId::new();
        let now = at(2024, 3, 11, 14, 0);

        let j1 = h
            .orchestrator
            .enroll_transfer(
                p1,
                &WarehouseId::new("WH-BER"),
                &WarehouseId::new("WH-MUC"),
                now,
            )
            .await
            .unwrap();
        let j2 = h
            .orchestrator
            .enroll_transfer(
                p2,
                &WarehouseId::new("WH-BER"),
                &WarehouseId::new("WH-MUC"),
                now,
            )
            .await
            .unwrap();

        assert_eq!(j1, j2);
        assert_eq!(h.fleet.transfer_job_count().await, 1);

        let job = h.fleet.get_transfer_job(j1).await.unwrap().unwrap();
        assert_eq!(job.parcel_ids, vec![p1, p2]);
        assert_eq!(job.connection, "WH-BER-WH-MUC");
        assert_eq!(job.date, pickup_date());
    }

    #[tokio::test]
    async fn evening_enrollment_rides_tomorrows_connection() {
        let h = harness();
        let evening = at(2024, 3, 11, 21, 0);

        let job_id = h
            .orchestrator
            .enroll_transfer(
                AggregateId::new(),
                &WarehouseId::new("WH-BER"),
                &WarehouseId::new("WH-MUC"),
                evening,
            )
            .await
            .unwrap();

        let job = h.fleet.get_transfer_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.date, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
    }

    #[tokio::test]
    async fn different_connections_get_separate_jobs() {
        let h = harness();
        let now = at(2024, 3, 11, 14, 0);

        h.orchestrator
            .enroll_transfer(
                AggregateId::new(),
                &WarehouseId::new("WH-BER"),
                &WarehouseId::new("WH-MUC"),
                now,
            )
            .await
            .unwrap();
        h.orchestrator
            .enroll_transfer(
                AggregateId::new(),
                &WarehouseId::new("WH-MUC"),
                &WarehouseId::new("WH-BER"),
                now,
            )
            .await
            .unwrap();

        assert_eq!(h.fleet.transfer_job_count().await, 2);
    }
}

mod sweep {
    use super::*;

    /// Crafts an in-warehouse parcel plus a hand-built delivery job with
    /// exact geometry, bypassing the optimizer.
    async fn seed_delivery_job(h: &Harness) -> (AggregateId, JobId) {
        h.fleet
            .put_warehouse(warehouse("WH-ORIGIN", 0.0, 0.0))
            .await
            .unwrap();

        let cmd = RegisterParcel::new(
            pickup_date(),
            Location::new(0.0, 0.0),
            delivery_date(),
            Location::new(10.0, 10.0),
            TransitPlan::direct(WarehouseId::new("WH-ORIGIN")),
        );
        let parcel_id = cmd.parcel_id;
        h.parcels.register(cmd).await.unwrap();
        h.parcels
            .record_pickup(RecordPickup::new(
                parcel_id,
                VehicleId::new("V-PICK"),
                at(2024, 3, 11, 8, 0),
            ))
            .await
            .unwrap();
        h.parcels
            .record_warehouse_arrival(RecordWarehouseArrival::new(
                parcel_id,
                WarehouseId::new("WH-ORIGIN"),
                at(2024, 3, 11, 9, 0),
            ))
            .await
            .unwrap();

        let job = Job {
            id: JobId::new(),
            kind: RouteKind::Delivery,
            status: JobStatus::Pending,
            date: delivery_date(),
            warehouse_id: WarehouseId::new("WH-ORIGIN"),
            vehicle_id: VehicleId::new("V-DEL"),
            duration_secs: 200,
            steps: vec![JobStep {
                location: Location::new(10.0, 10.0),
                arrival_offset_secs: 100,
                parcel_id,
            }],
        };
        let job_id = job.id;
        h.fleet.put_job(job).await.unwrap();
        h.active.add_vehicle(VehicleId::new("V-DEL")).await;

        (parcel_id, job_id)
    }

    #[tokio::test]
    async fn delivery_position_interpolates_along_the_leg() {
        let h = harness();
        let (parcel_id, _) = seed_delivery_job(&h).await;

        let t0 = at(2024, 3, 13, 9, 0);

        // First touch promotes the job and announces the outgoing leg.
        let report = h.generator.sweep(t0).await.unwrap();
        assert_eq!(report.events_emitted, 1);
        assert_eq!(h.bus.lifecycle_count("ParcelDeliveryStarted"), 1);
        let parcel = h.parcels.get_parcel(parcel_id).await.unwrap().unwrap();
        assert_eq!(parcel.status(), ParcelStatus::TransitToCustomer);

        // 25 of 100 seconds into the leg from (0,0) to (10,10): a quarter
        // of the way.
        h.generator.sweep(t0 + chrono::Duration::seconds(25)).await.unwrap();
        let position = h
            .generator
            .tracker()
            .position(&VehicleId::new("V-DEL"))
            .await
            .unwrap();
        assert!((position.location.lat - 2.5).abs() < 1e-9);
        assert!((position.location.lon - 2.5).abs() < 1e-9);

        // No domain event came out of the pure position update.
        assert_eq!(h.bus.lifecycle_count("ParcelDelivered"), 0);
    }

    #[tokio::test]
    async fn crossing_a_step_delivers_the_parcel() {
        let h = harness();
        let (parcel_id, _) = seed_delivery_job(&h).await;
        let t0 = at(2024, 3, 13, 9, 0);

        h.generator.sweep(t0).await.unwrap();
        // Past the step's arrival offset.
        let report = h
            .generator
            .sweep(t0 + chrono::Duration::seconds(120))
            .await
            .unwrap();
        assert_eq!(report.events_emitted, 1);

        let parcel = h.parcels.get_parcel(parcel_id).await.unwrap().unwrap();
        assert_eq!(parcel.status(), ParcelStatus::Delivered);

        // Vehicle reported at the customer's door.
        let position = h
            .generator
            .tracker()
            .position(&VehicleId::new("V-DEL"))
            .await
            .unwrap();
        assert_eq!(position.location, Location::new(10.0, 10.0));
    }

    #[tokio::test]
    async fn finished_job_returns_vehicle_to_the_warehouse_and_goes_idle() {
        let h = harness();
        let (_, job_id) = seed_delivery_job(&h).await;
        let t0 = at(2024, 3, 13, 9, 0);

        h.generator.sweep(t0).await.unwrap();
        h.generator
            .sweep(t0 + chrono::Duration::seconds(120))
            .await
            .unwrap();
        // Past the total duration: the job closes.
        h.generator
            .sweep(t0 + chrono::Duration::seconds(300))
            .await
            .unwrap();

        let job = h.fleet.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        let position = h
            .generator
            .tracker()
            .position(&VehicleId::new("V-DEL"))
            .await
            .unwrap();
        assert_eq!(position.location, Location::new(0.0, 0.0));

        // The next sweep notices the vehicle is idle and drops it.
        h.generator
            .sweep(t0 + chrono::Duration::seconds(400))
            .await
            .unwrap();
        assert!(h.active.vehicles().await.is_empty());
    }

    #[tokio::test]
    async fn two_in_progress_jobs_is_an_invariant_violation() {
        let h = harness();
        h.fleet
            .put_warehouse(warehouse("WH-BER", 52.52, 13.405))
            .await
            .unwrap();

        for _ in 0..2 {
            let job = Job {
                id: JobId::new(),
                kind: RouteKind::Pickup,
                status: JobStatus::InProgress,
                date: pickup_date(),
                warehouse_id: WarehouseId::new("WH-BER"),
                vehicle_id: VehicleId::new("V-1"),
                duration_secs: 600,
                steps: vec![],
            };
            h.fleet.put_job(job).await.unwrap();
        }
        h.active.add_vehicle(VehicleId::new("V-1")).await;

        let result = h.generator.sweep(at(2024, 3, 11, 10, 0)).await;
        assert!(matches!(
            result,
            Err(DispatchError::MultipleActiveJobs(_))
        ));
    }
}

mod transfer_schedule {
    use super::*;
    use domain::StartTransfer;

    async fn seed_transfer_parcel(h: &Harness) -> AggregateId {
        h.fleet
            .put_warehouse(warehouse("WH-BER", 52.52, 13.405))
            .await
            .unwrap();
        h.fleet
            .put_warehouse(warehouse("WH-MUC", 48.1374, 11.5755))
            .await
            .unwrap();

        let cmd = RegisterParcel::new(
            pickup_date(),
            Location::new(52.53, 13.41),
            delivery_date(),
            Location::new(48.14, 11.58),
            TransitPlan::via(WarehouseId::new("WH-BER"), WarehouseId::new("WH-MUC")),
        );
        let parcel_id = cmd.parcel_id;
        h.parcels.register(cmd).await.unwrap();
        h.parcels
            .record_pickup(RecordPickup::new(
                parcel_id,
                VehicleId::new("V-1"),
                at(2024, 3, 11, 9, 0),
            ))
            .await
            .unwrap();
        h.parcels
            .record_warehouse_arrival(RecordWarehouseArrival::new(
                parcel_id,
                WarehouseId::new("WH-BER"),
                at(2024, 3, 11, 10, 0),
            ))
            .await
            .unwrap();

        parcel_id
    }

    #[tokio::test]
    async fn transfer_departs_at_night_and_arrives_at_dawn() {
        let h = harness();
        let parcel_id = seed_transfer_parcel(&h).await;

        let job_id = h
            .orchestrator
            .enroll_transfer(
                parcel_id,
                &WarehouseId::new("WH-BER"),
                &WarehouseId::new("WH-MUC"),
                at(2024, 3, 11, 10, 0),
            )
            .await
            .unwrap();

        // Daytime sweeps leave the transfer pending.
        h.generator.sweep(at(2024, 3, 11, 15, 0)).await.unwrap();
        let job = h.fleet.get_transfer_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        // 21:00: the truck leaves.
        let report = h.generator.sweep(at(2024, 3, 11, 21, 0)).await.unwrap();
        assert_eq!(report.events_emitted, 1);
        let parcel = h.parcels.get_parcel(parcel_id).await.unwrap().unwrap();
        assert_eq!(parcel.status(), ParcelStatus::Transfer);

        // 05:00 next day: deterministic arrival; the parcel lands at its
        // final warehouse and the delivery order appears.
        h.generator.sweep(at(2024, 3, 12, 5, 0)).await.unwrap();
        let parcel = h.parcels.get_parcel(parcel_id).await.unwrap().unwrap();
        assert_eq!(parcel.status(), ParcelStatus::InWarehouse);
        assert_eq!(
            parcel.current_warehouse(),
            Some(&WarehouseId::new("WH-MUC"))
        );
        assert_eq!(h.fleet.order_count().await, 1);
        assert!(h.active.transfers().await.is_empty());
    }

    #[tokio::test]
    async fn four_oclock_arrival_depends_on_the_roll() {
        let h = harness();
        let parcel_id = seed_transfer_parcel(&h).await;

        let job_id = h
            .orchestrator
            .enroll_transfer(
                parcel_id,
                &WarehouseId::new("WH-BER"),
                &WarehouseId::new("WH-MUC"),
                at(2024, 3, 11, 10, 0),
            )
            .await
            .unwrap();
        // Depart.
        h.generator.sweep(at(2024, 3, 11, 21, 0)).await.unwrap();

        // An unlucky roll keeps the truck on the road at 04:00.
        let unlucky = harness_with_roll(&h, 0.9);
        unlucky.sweep(at(2024, 3, 12, 4, 0)).await.unwrap();
        let job = h.fleet.get_transfer_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::InProgress);

        // A lucky roll (below the 30% chance) completes it at 04:00.
        let lucky = harness_with_roll(&h, 0.1);
        lucky.sweep(at(2024, 3, 12, 4, 0)).await.unwrap();
        let job = h.fleet.get_transfer_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    /// A second generator over the same shared state with a pinned roll.
    fn harness_with_roll(h: &Harness, roll: f64) -> Generator {
        ProgressGenerator::new(
            h.fleet.clone(),
            h.parcels.clone(),
            h.orchestrator.clone(),
            h.bus.clone(),
            h.active.clone(),
            VehicleTracker::new(),
        )
        .with_roll(move || roll)
    }

    #[tokio::test]
    async fn started_transfer_is_no_longer_a_coalescing_target() {
        let h = harness();
        let parcel_id = seed_transfer_parcel(&h).await;

        let first = h
            .orchestrator
            .enroll_transfer(
                parcel_id,
                &WarehouseId::new("WH-BER"),
                &WarehouseId::new("WH-MUC"),
                at(2024, 3, 11, 10, 0),
            )
            .await
            .unwrap();
        h.parcels
            .start_transfer(StartTransfer::new(
                parcel_id,
                first,
                WarehouseId::new("WH-MUC"),
                at(2024, 3, 11, 21, 0),
            ))
            .await
            .ok();
        // Force the job out of Pending.
        let mut job = h.fleet.get_transfer_job(first).await.unwrap().unwrap();
        job.status = JobStatus::InProgress;
        h.fleet.put_transfer_job(job).await.unwrap();

        // A late parcel for the same connection+date opens a fresh job.
        let second = h
            .orchestrator
            .enroll_transfer(
                AggregateId::new(),
                &WarehouseId::new("WH-BER"),
                &WarehouseId::new("WH-MUC"),
                at(2024, 3, 11, 11, 0),
            )
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(h.fleet.transfer_job_count().await, 2);
    }
}

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn single_hop_parcel_reaches_delivered_through_the_machinery() {
        let h = harness();
        h.fleet
            .put_warehouse(warehouse("WH-BER", 52.52, 13.405))
            .await
            .unwrap();
        h.fleet
            .put_vehicle(vehicle("V-P1", "WH-BER", RouteKind::Pickup))
            .await
            .unwrap();
        h.fleet
            .put_vehicle(vehicle("V-D1", "WH-BER", RouteKind::Delivery))
            .await
            .unwrap();

        let parcel_id = seed_parcel(
            &h,
            TransitPlan::direct(WarehouseId::new("WH-BER")),
            Location::new(52.53, 13.41),
            Location::new(52.56, 13.45),
        )
        .await;

        // Batch the pickup route and drive it with half-hour sweeps.
        h.orchestrator
            .create_pickup_jobs(&WarehouseId::new("WH-BER"), pickup_date())
            .await
            .unwrap();

        let mut clock = at(2024, 3, 11, 8, 0);
        for _ in 0..6 {
            h.generator.sweep(clock).await.unwrap();
            clock = clock + chrono::Duration::minutes(30);
        }

        // The pickup route finished: parcel is in the warehouse and its
        // delivery order exists.
        let parcel = h.parcels.get_parcel(parcel_id).await.unwrap().unwrap();
        assert_eq!(parcel.status(), ParcelStatus::InWarehouse);
        assert_eq!(h.fleet.order_count().await, 1);

        // Batch the delivery route for the delivery date and drive it.
        h.orchestrator
            .create_delivery_jobs(&WarehouseId::new("WH-BER"), delivery_date())
            .await
            .unwrap();

        let mut clock = at(2024, 3, 13, 8, 0);
        for _ in 0..6 {
            h.generator.sweep(clock).await.unwrap();
            clock = clock + chrono::Duration::minutes(30);
        }

        let parcel = h.parcels.get_parcel(parcel_id).await.unwrap().unwrap();
        assert_eq!(parcel.status(), ParcelStatus::Delivered);

        // Lifecycle notices flowed for every stage.
        assert_eq!(h.bus.lifecycle_count("ParcelPickedUp"), 1);
        assert_eq!(h.bus.lifecycle_count("ParcelArrivedAtWarehouse"), 1);
        assert_eq!(h.bus.lifecycle_count("ParcelDeliveryStarted"), 1);
        assert_eq!(h.bus.lifecycle_count("ParcelDelivered"), 1);
    }

    #[tokio::test]
    async fn two_hop_parcel_rides_the_nightly_transfer() {
        let h = harness();
        h.fleet
            .put_warehouse(warehouse("WH-BER", 52.52, 13.405))
            .await
            .unwrap();
        h.fleet
            .put_warehouse(warehouse("WH-MUC", 48.1374, 11.5755))
            .await
            .unwrap();
        h.fleet
            .put_vehicle(vehicle("V-P1", "WH-BER", RouteKind::Pickup))
            .await
            .unwrap();
        h.fleet
            .put_vehicle(vehicle("V-D1", "WH-MUC", RouteKind::Delivery))
            .await
            .unwrap();

        let parcel_id = seed_parcel(
            &h,
            TransitPlan::via(WarehouseId::new("WH-BER"), WarehouseId::new("WH-MUC")),
            Location::new(52.53, 13.41),
            Location::new(48.14, 11.58),
        )
        .await;

        h.orchestrator
            .create_pickup_jobs(&WarehouseId::new("WH-BER"), pickup_date())
            .await
            .unwrap();

        let mut clock = at(2024, 3, 11, 8, 0);
        for _ in 0..6 {
            h.generator.sweep(clock).await.unwrap();
            clock = clock + chrono::Duration::minutes(30);
        }

        // Arrival at the intermediate warehouse queued the transfer, not a
        // delivery order.
        let parcel = h.parcels.get_parcel(parcel_id).await.unwrap().unwrap();
        assert_eq!(parcel.status(), ParcelStatus::ToTransfer);
        assert_eq!(h.fleet.order_count().await, 0);
        assert_eq!(h.fleet.transfer_job_count().await, 1);

        // Night sweep: the transfer departs; dawn sweep: it arrives.
        h.generator.sweep(at(2024, 3, 11, 21, 0)).await.unwrap();
        h.generator.sweep(at(2024, 3, 12, 5, 0)).await.unwrap();

        let parcel = h.parcels.get_parcel(parcel_id).await.unwrap().unwrap();
        assert_eq!(parcel.status(), ParcelStatus::InWarehouse);
        assert_eq!(
            parcel.current_warehouse(),
            Some(&WarehouseId::new("WH-MUC"))
        );

        // The delivery leg runs out of Munich.
        h.orchestrator
            .create_delivery_jobs(&WarehouseId::new("WH-MUC"), delivery_date())
            .await
            .unwrap();

        let mut clock = at(2024, 3, 13, 8, 0);
        for _ in 0..6 {
            h.generator.sweep(clock).await.unwrap();
            clock = clock + chrono::Duration::minutes(30);
        }

        let parcel = h.parcels.get_parcel(parcel_id).await.unwrap().unwrap();
        assert_eq!(parcel.status(), ParcelStatus::Delivered);
    }
}
