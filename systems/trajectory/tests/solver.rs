use berry_grove_core::TrajectoryError;
use berry_grove_system_trajectory::{facing, solve};
use glam::Vec3;

#[test]
fn valid_launches_produce_finite_positive_flights() {
    let origins = [Vec3::ZERO, Vec3::new(-3.0, 1.5, 2.0)];
    let targets = [
        Vec3::new(0.0, 0.0, 0.25),
        Vec3::new(10.0, 0.0, -4.0),
        Vec3::new(-40.0, 12.0, 35.0),
        Vec3::new(0.5, -6.0, 0.5),
    ];

    for origin in origins {
        for target in targets {
            for angle in [5.0, 15.0, 30.0, 45.0, 60.0, 75.0, 89.0] {
                for gravity in [1.62, 9.81, 24.79] {
                    let plan = solve(origin, target, angle, gravity).unwrap_or_else(|error| {
                        panic!("{origin} -> {target} at {angle} deg failed: {error}")
                    });
                    assert!(plan.horizontal_velocity.is_finite());
                    assert!(plan.vertical_velocity.is_finite());
                    assert!(plan.total_time.is_finite());
                    assert!(plan.total_time > 0.0);
                }
            }
        }
    }
}

#[test]
fn right_and_flat_angles_fail_without_dividing_by_zero() {
    let target = Vec3::new(2.0, 0.0, 9.0);
    assert_eq!(
        solve(Vec3::ZERO, target, 90.0, 9.81),
        Err(TrajectoryError::InvalidTrajectory)
    );
    assert_eq!(
        solve(Vec3::ZERO, target, 0.0, 9.81),
        Err(TrajectoryError::InvalidTrajectory)
    );
}

#[test]
fn continuous_arc_returns_to_launch_height_at_total_time() {
    let origin = Vec3::new(1.0, 0.0, 0.0);
    let target = Vec3::new(13.0, 0.0, 5.0);
    let gravity = 9.81;

    for angle in [20.0_f32, 45.0, 70.0] {
        let plan = solve(origin, target, angle, gravity).expect("valid launch");
        let t = plan.total_time;
        let forward = plan.horizontal_velocity * t;
        let rise = plan.vertical_velocity * t - 0.5 * gravity * t * t;

        assert!((forward - plan.distance).abs() < 1.0e-3, "angle {angle}");
        assert!(rise.abs() < 1.0e-3, "angle {angle} left residual rise {rise}");
    }
}

#[test]
fn steeper_angles_fly_longer() {
    let target = Vec3::new(0.0, 0.0, 20.0);
    let shallow = solve(Vec3::ZERO, target, 30.0, 9.81).expect("valid");
    let steep = solve(Vec3::ZERO, target, 60.0, 9.81).expect("valid");

    assert!(steep.total_time > shallow.total_time);
    assert!(steep.vertical_velocity > shallow.vertical_velocity);
}

#[test]
fn facing_frame_is_orthonormal() {
    let rotation = facing(Vec3::new(2.0, 1.0, 2.0), Vec3::new(-7.0, 3.0, 11.0));
    let right = rotation * Vec3::X;
    let up = rotation * Vec3::Y;
    let forward = rotation * Vec3::Z;

    assert!(right.dot(up).abs() < 1.0e-5);
    assert!(right.dot(forward).abs() < 1.0e-5);
    assert!(up.dot(forward).abs() < 1.0e-5);
    assert!(right.y.abs() < 1.0e-5, "right axis stays horizontal");
}
