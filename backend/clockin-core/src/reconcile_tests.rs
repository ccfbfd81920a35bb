// src/reconcile_tests.rs

#[cfg(test)]
mod tests {
    use tokio::runtime::Runtime;

    use crate::bootstrap::MonthContext;
    use crate::factorial_client::SHIFTS_PATH;
    use crate::reconcile::{
        classify_day, DayFilters, DayOutcome, DayReport, FilterReason, ReconcileOptions,
        ReconciliationEngine,
    };
    use crate::schedule::{ClockTime, Interval, SchedulePolicy};
    use crate::test_support::{date, day_off, march_2025, shift, working_day, FakeApi};

    fn iv(start: &str, end: &str) -> Interval {
        Interval::parse(start, end).unwrap()
    }

    fn options(today: &str) -> ReconcileOptions {
        ReconcileOptions {
            requested: iv("09:00", "18:00"),
            filters: DayFilters::default(),
            today: date(today),
            dry_run: false,
        }
    }

    fn run(api: &FakeApi, month: &MonthContext, options: &ReconcileOptions) -> Vec<DayReport> {
        let rt = Runtime::new().unwrap();
        let engine = ReconciliationEngine::new(api, SchedulePolicy::default());
        rt.block_on(async { engine.reconcile(month, options, |_| {}).await })
    }

    fn outcomes(reports: &[DayReport]) -> Vec<DayOutcome> {
        reports.iter().map(|r| r.outcome.clone()).collect()
    }

    #[test]
    fn test_saturday_is_skipped_as_non_laborable() {
        let api = FakeApi::new();
        let month = march_2025(vec![day_off("2025-03-01")], vec![]);

        let reports = run(&api, &month, &options("2025-03-20"));

        assert_eq!(
            outcomes(&reports),
            vec![DayOutcome::SkippedNonLaborable("Saturday".to_string())]
        );
        assert!(api.requests().is_empty());
    }

    #[test]
    fn test_friday_submits_one_short_shift() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 201, "{}");
        let month = march_2025(vec![working_day("2025-03-07")], vec![]);

        let reports = run(&api, &month, &options("2025-03-20"));

        assert_eq!(
            outcomes(&reports),
            vec![DayOutcome::Created(vec![iv("08:00", "15:00")])]
        );
        let posted = api.posted_shifts();
        assert_eq!(posted.len(), 1);
        let request = &posted[0];
        assert_eq!(request.clock_in, ClockTime::from_hm(8, 0).unwrap());
        assert_eq!(request.clock_out, ClockTime::from_hm(15, 0).unwrap());
        assert_eq!(request.location_type, "work_from_home");
        assert_eq!(request.source, "desktop");
        assert_eq!(request.employee_id, 42);
        assert_eq!(request.day, 7);
        assert_eq!(request.date, date("2025-03-07"));
        assert_eq!(request.reference_date, date("2025-03-07"));
        assert!(request.workable);
        assert_eq!(request.minutes, None);
        assert_eq!(request.time_settings_break_configuration_id, None);
    }

    #[test]
    fn test_posted_payload_carries_expected_fields() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 201, "{}");
        let month = march_2025(vec![working_day("2025-03-07")], vec![]);

        run(&api, &month, &options("2025-03-20"));

        let body = api.requests()[0].json.clone().unwrap();
        assert_eq!(body["clock_in"], "08:00");
        assert_eq!(body["clock_out"], "15:00");
        assert_eq!(body["date"], "2025-03-07");
        assert!(body["minutes"].is_null());
        assert!(body["time_settings_break_configuration_id"].is_null());
    }

    #[test]
    fn test_regular_weekday_submits_split_shift() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 201, "{}");
        let month = march_2025(vec![working_day("2025-03-03")], vec![]);

        let reports = run(&api, &month, &options("2025-03-20"));

        let split = vec![iv("09:00", "14:15"), iv("15:00", "18:00")];
        assert_eq!(outcomes(&reports), vec![DayOutcome::Created(split.clone())]);
        let posted: Vec<Interval> = api
            .posted_shifts()
            .iter()
            .map(|r| Interval::new(r.clock_in, r.clock_out))
            .collect();
        assert_eq!(posted, split);
    }

    #[test]
    fn test_july_monday_submits_one_short_shift() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 201, "{}");
        let mut month = march_2025(vec![working_day("2025-07-07")], vec![]);
        month.period.month = 7;

        run(&api, &month, &options("2025-07-20"));

        assert_eq!(api.posted_shifts().len(), 1);
    }

    #[test]
    fn test_contained_existing_shift_is_reported_as_overlap() {
        let api = FakeApi::new();
        let month = march_2025(
            vec![working_day("2025-03-05")],
            vec![shift(1, 5, "10:00", "11:00")],
        );

        let reports = run(&api, &month, &options("2025-03-20"));

        assert_eq!(
            outcomes(&reports),
            vec![DayOutcome::SkippedOverlap("10:00 - 11:00".to_string())]
        );
        assert_eq!(api.count("POST", SHIFTS_PATH), 0);
    }

    #[test]
    fn test_adjacent_or_other_day_shifts_do_not_block() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 201, "{}");
        let month = march_2025(
            vec![working_day("2025-03-05")],
            vec![
                shift(1, 5, "18:00", "19:00"),
                shift(2, 5, "07:00", "09:00"),
                shift(3, 6, "10:00", "11:00"),
            ],
        );

        let reports = run(&api, &month, &options("2025-03-20"));

        assert!(reports[0].outcome.is_created());
        assert_eq!(api.count("POST", SHIFTS_PATH), 2);
    }

    #[test]
    fn test_open_shift_inside_request_blocks_the_day() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 201, "{}");
        let month = march_2025(
            vec![working_day("2025-03-05")],
            vec![shift(1, 5, "10:00", "")],
        );

        let reports = run(&api, &month, &options("2025-03-20"));

        assert_eq!(
            outcomes(&reports),
            vec![DayOutcome::SkippedOverlap("10:00 - ".to_string())]
        );
        assert_eq!(api.count("POST", SHIFTS_PATH), 0);
    }

    #[test]
    fn test_open_shift_outside_request_does_not_block() {
        let month = march_2025(
            vec![working_day("2025-03-05")],
            vec![shift(1, 5, "18:00", ""), shift(2, 5, "08:00", "")],
        );
        assert_eq!(
            classify_day(&month.calendar[0], &month.shifts, &options("2025-03-20")),
            None
        );
    }

    #[test]
    fn test_unreadable_existing_shift_is_ignored() {
        let month = march_2025(
            vec![working_day("2025-03-05")],
            vec![shift(1, 5, "ten", ""), shift(2, 5, "10:00", "noon")],
        );
        assert_eq!(
            classify_day(&month.calendar[0], &month.shifts, &options("2025-03-20")),
            None
        );
    }

    #[test]
    fn test_overlap_is_checked_before_leave_and_laborable() {
        let mut holiday = day_off("2025-03-05");
        holiday.is_leave = true;
        holiday.leave_name = "Vacation".to_string();
        let shifts = vec![shift(1, 5, "09:00", "18:00")];

        assert_eq!(
            classify_day(&holiday, &shifts, &options("2025-03-20")),
            Some(DayOutcome::SkippedOverlap("09:00 - 18:00".to_string()))
        );
    }

    #[test]
    fn test_leave_day_is_skipped_with_leave_name() {
        let api = FakeApi::new();
        let mut leave = working_day("2025-03-05");
        leave.is_leave = true;
        leave.leave_name = "Vacation".to_string();
        let month = march_2025(vec![leave], vec![]);

        let reports = run(&api, &month, &options("2025-03-20"));

        assert_eq!(
            outcomes(&reports),
            vec![DayOutcome::SkippedLeave("Vacation".to_string())]
        );
        assert!(api.requests().is_empty());
    }

    #[test]
    fn test_today_only_restricts_to_matching_day() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 201, "{}");
        let month = march_2025(
            ["2025-03-03", "2025-03-04", "2025-03-05", "2025-03-06"]
                .into_iter()
                .map(working_day)
                .collect(),
            vec![],
        );
        let mut opts = options("2025-03-05");
        opts.filters.today_only = true;

        let reports = run(&api, &month, &opts);

        let statuses: Vec<(u32, bool)> = reports
            .iter()
            .map(|r| (r.day, r.outcome.is_created()))
            .collect();
        assert_eq!(statuses, vec![(3, false), (4, false), (5, true), (6, false)]);
        assert_eq!(
            reports[0].outcome,
            DayOutcome::SkippedFilter(FilterReason::Today)
        );
        assert!(api.posted_shifts().iter().all(|r| r.day == 5));
    }

    #[test]
    fn test_until_today_is_inclusive() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 201, "{}");
        let month = march_2025(
            ["2025-03-03", "2025-03-04", "2025-03-05", "2025-03-06"]
                .into_iter()
                .map(working_day)
                .collect(),
            vec![],
        );
        let mut opts = options("2025-03-05");
        opts.filters.until_today = true;

        let reports = run(&api, &month, &opts);

        let created: Vec<u32> = reports
            .iter()
            .filter(|r| r.outcome.is_created())
            .map(|r| r.day)
            .collect();
        assert_eq!(created, vec![3, 4, 5]);
        assert_eq!(
            reports[3].outcome,
            DayOutcome::SkippedFilter(FilterReason::UntilToday)
        );
    }

    #[test]
    fn test_dry_run_sends_nothing_and_reports_created() {
        let api = FakeApi::new();
        let month = march_2025(
            vec![
                day_off("2025-03-01"),
                working_day("2025-03-03"),
                working_day("2025-03-07"),
            ],
            vec![],
        );
        let mut opts = options("2025-03-20");
        opts.dry_run = true;

        let reports = run(&api, &month, &opts);

        assert!(api.requests().is_empty());
        assert_eq!(reports.len(), 3);
        assert!(!reports[0].outcome.is_created());
        assert!(reports[1].outcome.is_created());
        assert!(reports[2].outcome.is_created());
    }

    #[test]
    fn test_one_failed_half_of_split_shift_is_partial() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 201, "{}")
            .respond("POST", SHIFTS_PATH, 422, "{\"error\":\"overlap\"}");
        let month = march_2025(vec![working_day("2025-03-03")], vec![]);

        let reports = run(&api, &month, &options("2025-03-20"));

        assert_eq!(
            outcomes(&reports),
            vec![DayOutcome::PartiallyCreated {
                created: vec![iv("09:00", "14:15")],
                failed: vec![iv("15:00", "18:00")],
            }]
        );
    }

    #[test]
    fn test_all_submissions_failing_is_failed_and_next_day_continues() {
        let api = FakeApi::new();
        api.respond("POST", SHIFTS_PATH, 500, "")
            .respond("POST", SHIFTS_PATH, 500, "")
            .respond("POST", SHIFTS_PATH, 201, "{}");
        let month = march_2025(
            vec![working_day("2025-03-03"), working_day("2025-03-07")],
            vec![],
        );

        let reports = run(&api, &month, &options("2025-03-20"));

        assert_eq!(reports[0].outcome, DayOutcome::Failed);
        assert!(reports[1].outcome.is_created());
        assert_eq!(api.count("POST", SHIFTS_PATH), 3);
    }

    #[test]
    fn test_reports_follow_calendar_order_and_carry_quota() {
        let api = FakeApi::new();
        let month = march_2025(
            vec![
                day_off("2025-03-01"),
                day_off("2025-03-02"),
                working_day("2025-03-03"),
            ],
            vec![],
        );
        let mut opts = options("2025-03-20");
        opts.dry_run = true;

        let mut seen = Vec::new();
        let rt = Runtime::new().unwrap();
        let engine = ReconciliationEngine::new(&api, SchedulePolicy::default());
        let reports = rt.block_on(async {
            engine
                .reconcile(&month, &opts, |r| seen.push(r.day))
                .await
        });

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(reports[1].outcome, DayOutcome::SkippedNonLaborable("Sunday".to_string()));
        assert_eq!(reports[2].minutes_left, rust_decimal::Decimal::new(480, 0));
    }

    #[test]
    fn test_custom_location_type_and_source() {
        let api = FakeApi::new();
        let engine = ReconciliationEngine::new(&api, SchedulePolicy::default())
            .with_location_type("office")
            .with_source("cli");

        let requests = engine.build_requests(&working_day("2025-03-03"), 7);

        assert_eq!(requests.len(), 2);
        assert!(requests
            .iter()
            .all(|r| r.location_type == "office" && r.source == "cli" && r.employee_id == 7));
    }

    #[test]
    fn test_outcome_status_and_detail() {
        let partial = DayOutcome::PartiallyCreated {
            created: vec![iv("09:00", "14:15")],
            failed: vec![iv("15:00", "18:00")],
        };
        assert_eq!(partial.status(), "partially_created");
        assert_eq!(
            partial.detail(),
            "created 09:00 - 14:15; failed 15:00 - 18:00"
        );
        let filtered = DayOutcome::SkippedFilter(FilterReason::Today);
        assert_eq!(filtered.status(), "skipped_filter");
        assert_eq!(filtered.detail(), "Skipping: --today");
    }
}
