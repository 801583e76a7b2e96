use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::repositories;
use crate::test_support;

const TRANSCRIPT: &str = "<p><strong>1</strong> The museum opens at ____</p>\
<p>Visitors should bring a <b>2</b> ____</p>\
<div>Choose <strong>TWO</strong> letters: which facilities are free?</div>";

#[tokio::test]
async fn non_admins_are_rejected() {
    let ctx = test_support::setup_test_context().await;
    let student =
        test_support::insert_user(ctx.state.db(), "student100", UserRole::Student, false).await;
    let exam_id = test_support::insert_exam(ctx.state.db(), "Reading", true).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/admin/exams/{exam_id}/access"),
            Some(&token),
            None,
        ))
        .await
        .expect("get access");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Admin access required");
}

#[tokio::test]
async fn admin_replaces_and_reads_access_types() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_user(ctx.state.db(), "admin100", UserRole::Admin, false).await;
    let exam_id = test_support::insert_exam(ctx.state.db(), "Reading", true).await;
    test_support::set_access_types(ctx.state.db(), &exam_id, &["student"]).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/admin/exams/{exam_id}/access"),
            Some(&token),
            Some(json!({ "access_types": ["vip", "premium"] })),
        ))
        .await
        .expect("invalid update");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid access type: premium. Must be one of: no vip, vip, student");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/admin/exams/{exam_id}/access"),
            Some(&token),
            Some(json!({ "access_types": ["no vip", "vip"] })),
        ))
        .await
        .expect("update access");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["message"], "Exam access types updated successfully");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/admin/exams/{exam_id}/access"),
            Some(&token),
            None,
        ))
        .await
        .expect("get access");
    let body = test_support::read_json(response).await;
    let mut tags: Vec<String> = body["access_types"]
        .as_array()
        .expect("tags")
        .iter()
        .map(|tag| tag.as_str().expect("tag").to_string())
        .collect();
    tags.sort();
    assert_eq!(tags, vec!["no vip".to_string(), "vip".to_string()]);
    assert!(body.get("message").is_none());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/admin/exams/missing/access",
            Some(&token),
            None,
        ))
        .await
        .expect("missing exam");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listening_test_activates_once_all_parts_have_media() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "admin101", UserRole::Admin, false).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/admin/listening-tests",
            Some(&token),
            Some(json!({ "title": "Listening Test 7" })),
        ))
        .await
        .expect("init listening");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    let exam_id = body["exam_id"].as_str().expect("exam id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/admin/listening-tests",
            Some(&token),
            Some(json!({ "title": "Listening Test 7" })),
        ))
        .await
        .expect("duplicate listening");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "An exam with the title 'Listening Test 7' already exists");

    let questions = json!([
        { "question_type": "fill_blank", "correct_answer": "9 am or nine", "marks": 1 },
        { "question_type": "fill_blank", "correct_answer": "ticket", "marks": 1 },
        {
            "question_type": "multiple_choice",
            "correct_answer": "A",
            "marks": 1,
            "options": [
                { "option_text": "A Parking", "is_correct": true },
                { "option_text": "B Lockers", "is_correct": false }
            ]
        }
    ]);

    for part in 1..=4 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                &format!("/api/v1/admin/listening-tests/{exam_id}/parts/{part}"),
                Some(&token),
                Some(json!({
                    "audio_filename": format!("part{part}.mp3"),
                    "transcript": TRANSCRIPT,
                    "questions": questions,
                })),
            ))
            .await
            .expect("update part");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["message"], format!("Part {part} updated successfully"));
        assert_eq!(body["questions_count"], 3);
        assert_eq!(body["questions_found"], 4);
        assert_eq!(body["questions_created"], 3);
        assert_eq!(body["exam_active"], part == 4);
    }

    let exam = repositories::exams::find_by_id(db, &exam_id)
        .await
        .expect("query")
        .expect("exam");
    assert!(exam.is_active);
    let stored = repositories::content::list_questions_by_exam(db, &exam_id)
        .await
        .expect("questions");
    // One transcript question plus three scored questions per part.
    assert_eq!(stored.len(), 16);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/admin/listening-tests/{exam_id}/parts/5"),
            Some(&token),
            Some(json!({ "audio_filename": "part5.mp3", "questions": [] })),
        ))
        .await
        .expect("part five");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Part number must be between 1 and 4");
}

#[tokio::test]
async fn writing_test_completes_with_two_parts_and_status_toggles() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "admin102", UserRole::Admin, false).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/admin/writing-tests",
            Some(&token),
            Some(json!({ "title": "Writing Test 3" })),
        ))
        .await
        .expect("init writing");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    let exam_id = body["exam_id"].as_str().expect("exam id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/admin/writing-tests/{exam_id}/parts"),
            Some(&token),
            Some(json!({
                "part_number": 3,
                "task_type": "essay",
                "instructions": "Discuss",
                "word_limit": 250
            })),
        ))
        .await
        .expect("part three");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let parts = [(1, "report", 150, 13.0, 20), (2, "essay", 250, 27.0, 40)];
    for (part_number, task_type, word_limit, total_marks, duration) in parts {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/admin/writing-tests/{exam_id}/parts"),
                Some(&token),
                Some(json!({
                    "part_number": part_number,
                    "task_type": task_type,
                    "instructions": format!("Instructions for part {part_number}"),
                    "word_limit": word_limit,
                    "total_marks": total_marks,
                    "duration": duration
                })),
            ))
            .await
            .expect("add part");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["is_complete"], part_number == 2);
    }

    let sections = repositories::sections::list_by_exam(db, &exam_id).await.expect("sections");
    assert_eq!(sections[0].duration, 60);
    assert_eq!(sections[0].total_marks, 40.0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/admin/exams/{exam_id}/status?active=false"),
            Some(&token),
            None,
        ))
        .await
        .expect("deactivate");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["message"], "Exam deactivated successfully");
    assert_eq!(body["is_active"], false);

    let exam = repositories::exams::find_by_id(db, &exam_id)
        .await
        .expect("query")
        .expect("exam");
    assert!(!exam.is_active);
}

fn reading_part_body(part: i32, numbers: std::ops::RangeInclusive<i32>) -> serde_json::Value {
    let questions: Vec<serde_json::Value> = numbers
        .clone()
        .map(|number| {
            json!({
                "question_text": format!("Statement {number}"),
                "question_type": "true_false",
                "correct_answer": "TRUE",
                "marks": 1,
                "question_number": number,
            })
        })
        .collect();
    json!({
        "passage": {
            "title": format!("Passage {part}"),
            "content": "<p>The <b>glaciers</b> of the north&nbsp;retreat each summer.</p>",
        },
        "question_groups": [{
            "instruction": "Do the following statements agree with the passage?",
            "question_range": format!("{}-{}", numbers.start(), numbers.end()),
            "group_type": "true_false_ng",
            "order_number": 1,
            "questions": questions,
        }],
    })
}

#[tokio::test]
async fn reading_test_activates_once_all_parts_are_complete() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "admin103", UserRole::Admin, false).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/admin/reading-tests",
            Some(&token),
            Some(json!({ "title": "Reading Test 2" })),
        ))
        .await
        .expect("init reading");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["message"], "Reading test initialized successfully");
    let exam_id = body["exam_id"].as_str().expect("exam id").to_string();

    let sections = repositories::sections::list_by_exam(db, &exam_id).await.expect("sections");
    let plan: Vec<(i32, i32, f64)> = sections
        .iter()
        .map(|section| (section.order_number, section.duration, section.total_marks))
        .collect();
    assert_eq!(plan, vec![(1, 20, 13.0), (2, 20, 13.0), (3, 20, 14.0)]);

    let rejected = [
        (4, reading_part_body(4, 1..=13), "Part number must be between 1 and 3"),
        (2, reading_part_body(2, 14..=25), "Part 2 must have exactly 13 questions, but got 12"),
        (
            2,
            reading_part_body(2, 13..=25),
            "Question number 13 is out of range for part 2. Must be between 14 and 26.",
        ),
    ];
    for (part, payload, detail) in rejected {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                &format!("/api/v1/admin/reading-tests/{exam_id}/parts/{part}"),
                Some(&token),
                Some(payload),
            ))
            .await
            .expect("rejected part");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
        assert_eq!(body["detail"], detail);
    }

    for (part, numbers) in [(1, 1..=13), (2, 14..=26), (3, 27..=40)] {
        let expected = numbers.clone().count();
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                &format!("/api/v1/admin/reading-tests/{exam_id}/parts/{part}"),
                Some(&token),
                Some(reading_part_body(part, numbers)),
            ))
            .await
            .expect("update part");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["message"], format!("Reading part {part} updated successfully"));
        assert_eq!(body["total_questions"], expected);
        assert_eq!(body["total_marks"], expected);
        assert_eq!(body["exam_active"], part == 3);
    }

    // Updating a part again replaces its passage and questions.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/admin/reading-tests/{exam_id}/parts/1"),
            Some(&token),
            Some(reading_part_body(1, 1..=13)),
        ))
        .await
        .expect("replace part");
    assert_eq!(response.status(), StatusCode::OK);

    let exam = repositories::exams::find_by_id(db, &exam_id)
        .await
        .expect("query")
        .expect("exam");
    assert!(exam.is_active);
    let passages = repositories::content::list_passages_by_exam(db, &exam_id)
        .await
        .expect("passages");
    assert_eq!(passages.len(), 3);
    assert!(passages.iter().all(|passage| passage.word_count == 8));
    let stored = repositories::content::list_questions_by_exam(db, &exam_id)
        .await
        .expect("questions");
    assert_eq!(stored.len(), 40);
}

#[tokio::test]
async fn admin_authors_speaking_topics_and_questions() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "admin104", UserRole::Admin, false).await;
    let student = test_support::insert_user(db, "student104", UserRole::Student, false).await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/admin/speaking/topics",
            Some(&admin_token),
            Some(json!({ "title": "Hometown", "description": "Talk about where you grew up" })),
        ))
        .await
        .expect("create topic");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["message"], "Speaking topic created successfully");
    let topic_id = body["topic_id"].as_str().expect("topic id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/admin/speaking/topics/{topic_id}/questions"),
            Some(&admin_token),
            Some(json!({ "question_text": "Where is it?", "part_type": "part4" })),
        ))
        .await
        .expect("bad part type");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Part type must be one of: part1, part2, part3");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/admin/speaking/topics/missing/questions",
            Some(&admin_token),
            Some(json!({ "question_text": "Where is it?", "part_type": "part1" })),
        ))
        .await
        .expect("missing topic");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Topic not found");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/admin/speaking/topics/{topic_id}/questions"),
            Some(&admin_token),
            Some(json!({
                "question_text": "Where is your hometown?",
                "sample_answer": "A small town by the sea.",
                "order_number": 1,
                "part_type": "part1"
            })),
        ))
        .await
        .expect("add question");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["message"], "Question added successfully");
    assert_eq!(body["topic_id"], topic_id.as_str());
    assert_eq!(body["part_type"], "part1");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/student/speaking/topics/{topic_id}"),
            Some(&student_token),
            None,
        ))
        .await
        .expect("topic detail");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["title"], "Hometown");
    let questions = body["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["question_text"], "Where is your hometown?");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/admin/speaking/topics",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("list topics");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["topic_id"], topic_id.as_str());
}
