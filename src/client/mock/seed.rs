//! Demo content written the first time a collection is read.

use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    notification::notification_models::{Notification, NotificationType},
    remark::remark_models::{Remark, RemarkType},
    task::task_models::{Priority, Task, TaskCategory, TaskStatus},
    user::user_models::{Role, UserResponse},
};

pub const ADMIN_ID: Uuid = Uuid::from_u128(1);
pub const JOHN_ID: Uuid = Uuid::from_u128(2);
pub const JANE_ID: Uuid = Uuid::from_u128(3);
pub const MIKE_ID: Uuid = Uuid::from_u128(4);
pub const SARAH_ID: Uuid = Uuid::from_u128(5);

const TASK_ID_BASE: u128 = 0x100;
const NOTIFICATION_ID_BASE: u128 = 0x200;
const REMARK_ID_BASE: u128 = 0x300;

pub fn task_id(index: usize) -> Uuid {
    Uuid::from_u128(TASK_ID_BASE + index as u128 + 1)
}

struct SeedUser {
    id: Uuid,
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
    post: &'static str,
    department: &'static str,
    joined: (i32, u32, u32),
}

const SEED_USERS: [SeedUser; 5] = [
    SeedUser {
        id: ADMIN_ID,
        name: "Admin User",
        email: "admin@amc.com",
        password: "admin123",
        role: Role::Admin,
        post: "System Administrator",
        department: "IT",
        joined: (2023, 1, 1),
    },
    SeedUser {
        id: JOHN_ID,
        name: "John Doe",
        email: "john@amc.com",
        password: "john123",
        role: Role::User,
        post: "IT Technician",
        department: "IT",
        joined: (2023, 3, 15),
    },
    SeedUser {
        id: JANE_ID,
        name: "Jane Smith",
        email: "jane@amc.com",
        password: "jane123",
        role: Role::User,
        post: "Network Engineer",
        department: "IT",
        joined: (2023, 2, 10),
    },
    SeedUser {
        id: MIKE_ID,
        name: "Mike Johnson",
        email: "mike@amc.com",
        password: "mike123",
        role: Role::User,
        post: "System Administrator",
        department: "IT",
        joined: (2023, 1, 5),
    },
    SeedUser {
        id: SARAH_ID,
        name: "Sarah Wilson",
        email: "sarah@amc.com",
        password: "sarah123",
        role: Role::User,
        post: "Security Specialist",
        department: "Security",
        joined: (2023, 4, 20),
    },
];

/// (title, description, category, estimated minutes)
const TASK_DEFINITIONS: [(&str, &str, TaskCategory, i32); 10] = [
    (
        "AV System Check",
        "Verify projectors, displays and audio in every conference room",
        TaskCategory::Daily,
        15,
    ),
    (
        "Network Connectivity Check",
        "Ping core switches and confirm uplinks on every floor",
        TaskCategory::Daily,
        20,
    ),
    (
        "Server Room Temperature Check",
        "Record rack inlet temperatures and humidity",
        TaskCategory::Daily,
        10,
    ),
    (
        "Security Camera Review",
        "Confirm all cameras are recording and storage is healthy",
        TaskCategory::Daily,
        20,
    ),
    (
        "Backup Verification",
        "Restore a sample file from last night's backup set",
        TaskCategory::Weekly,
        45,
    ),
    (
        "UPS Battery Inspection",
        "Check battery health and runtime estimates on all UPS units",
        TaskCategory::Weekly,
        30,
    ),
    (
        "Printer Maintenance",
        "Clear queues, check toner levels and clean feed rollers",
        TaskCategory::Weekly,
        25,
    ),
    (
        "Software Patch Review",
        "Review pending OS and application patches for rollout",
        TaskCategory::Monthly,
        60,
    ),
    (
        "Fire Alarm Panel Test",
        "Run the panel self test and log the results",
        TaskCategory::Monthly,
        40,
    ),
    (
        "Access Control Audit",
        "Reconcile badge access lists with current staff",
        TaskCategory::Monthly,
        90,
    ),
];

fn joined_on((year, month, day): (i32, u32, u32), fallback: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or(fallback)
}

pub fn users(now: DateTime<Utc>) -> Vec<UserResponse> {
    SEED_USERS
        .iter()
        .map(|u| UserResponse {
            id: u.id,
            name: u.name.to_string(),
            email: u.email.to_string(),
            role: u.role,
            post: Some(u.post.to_string()),
            department: Some(u.department.to_string()),
            avatar_url: None,
            join_date: joined_on(u.joined, now),
            last_login: None,
            is_active: true,
        })
        .collect()
}

/// Demo sign-in passwords keyed by email.
pub fn credentials() -> HashMap<String, String> {
    SEED_USERS
        .iter()
        .map(|u| (u.email.to_string(), u.password.to_string()))
        .collect()
}

/// Fills the assignee and assigner columns the API joins in from `users`.
pub fn attach_people(task: &mut Task, users: &[UserResponse]) {
    let find = |id: Option<Uuid>| id.and_then(|id| users.iter().find(|u| u.id == id));

    let assignee = find(task.assigned_to);
    task.assigned_to_name = assignee.map(|u| u.name.clone());
    task.assigned_to_email = assignee.map(|u| u.email.clone());

    let assigner = find(task.assigned_by);
    task.assigned_by_name = assigner.map(|u| u.name.clone());
    task.assigned_by_email = assigner.map(|u| u.email.clone());
}

pub fn tasks(now: DateTime<Utc>) -> Vec<Task> {
    let people = users(now);
    TASK_DEFINITIONS
        .iter()
        .enumerate()
        .map(|(index, (title, description, category, estimated))| {
            let status = if index % 4 == 0 {
                TaskStatus::Completed
            } else if index % 3 == 0 {
                TaskStatus::InProgress
            } else {
                TaskStatus::Pending
            };
            let priority = if index % 3 == 0 {
                Priority::High
            } else if index % 2 == 0 {
                Priority::Medium
            } else {
                Priority::Low
            };
            let assignee = if index < 5 { JOHN_ID } else { JANE_ID };

            let mut task = Task {
                id: task_id(index),
                title: title.to_string(),
                description: Some(description.to_string()),
                category: *category,
                status,
                priority,
                assigned_to: Some(assignee),
                assigned_by: Some(ADMIN_ID),
                due_date: Some(category.default_due_date(now)),
                estimated_time: Some(*estimated),
                actual_time: None,
                remarks: None,
                created_at: now,
                updated_at: now,
                completed_at: (status == TaskStatus::Completed).then_some(now),
                assigned_to_name: None,
                assigned_to_email: None,
                assigned_by_name: None,
                assigned_by_email: None,
            };
            attach_people(&mut task, &people);
            task
        })
        .collect()
}

pub fn notifications(now: DateTime<Utc>) -> Vec<Notification> {
    vec![
        Notification {
            id: Uuid::from_u128(NOTIFICATION_ID_BASE + 1),
            title: "New Task Assigned".to_string(),
            message: "AV System Check task has been assigned to you".to_string(),
            notification_type: NotificationType::TaskAssigned,
            priority: Priority::Medium,
            user_id: JOHN_ID,
            is_read: false,
            metadata: json!({ "taskId": task_id(0) }),
            created_at: now,
        },
        Notification {
            id: Uuid::from_u128(NOTIFICATION_ID_BASE + 2),
            title: "Task Reminder".to_string(),
            message: "Network Connectivity Check is due in 1 hour".to_string(),
            notification_type: NotificationType::TaskReminder,
            priority: Priority::High,
            user_id: JOHN_ID,
            is_read: false,
            metadata: json!({ "taskId": task_id(1) }),
            created_at: now,
        },
    ]
}

pub fn remarks(now: DateTime<Utc>) -> Vec<Remark> {
    vec![
        Remark {
            id: Uuid::from_u128(REMARK_ID_BASE + 1),
            user_id: JOHN_ID,
            task_id: Some(task_id(0)),
            message: "The AV system in conference room A is not responding. Basic troubleshooting did not help.".to_string(),
            remark_type: RemarkType::Issue,
            admin_response: Some(
                "Thanks for reporting this. The AV vendor will visit tomorrow morning.".to_string(),
            ),
            responded_at: Some(now - Duration::days(1)),
            created_at: now - Duration::days(2),
        },
        Remark {
            id: Uuid::from_u128(REMARK_ID_BASE + 2),
            user_id: JANE_ID,
            task_id: None,
            message: "We should automate backup verification instead of checking it by hand.".to_string(),
            remark_type: RemarkType::Suggestion,
            admin_response: None,
            responded_at: None,
            created_at: now - Duration::hours(6),
        },
        Remark {
            id: Uuid::from_u128(REMARK_ID_BASE + 3),
            user_id: MIKE_ID,
            task_id: Some(task_id(2)),
            message: "Server room temperature monitoring is working well. Nothing to report this week.".to_string(),
            remark_type: RemarkType::Feedback,
            admin_response: None,
            responded_at: None,
            created_at: now - Duration::hours(2),
        },
    ]
}
