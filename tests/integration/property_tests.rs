//! Engine-level properties: identity, idempotence, ordering, and the
//! monotonicity guarantees on the main manifest's declared versions.

use manifestmerge::{read_document, write_document, Document, MergeEngine, Severity};

fn doc(file_id: &str, source: &str) -> Document {
    read_document(file_id, source).unwrap()
}

const MAIN: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">
    <uses-sdk android:minSdkVersion="8" android:targetSdkVersion="14" />
    <uses-permission android:name="android.permission.INTERNET" />
    <application android:name="com.example.TheApp"
        android:label="@string/app_name">
        <activity android:name="com.example.MainActivity" />
        <uses-library android:name="com.example.maps" android:required="true" />
    </application>
</manifest>
"#;

const LIB: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-permission android:name="android.permission.INTERNET" />
    <uses-feature android:name="android.hardware.camera" />
    <application>
        <!-- Shared login screen. -->
        <activity android:name="com.example.lib.LoginActivity" />
        <uses-library android:name="com.example.maps" android:required="true" />
    </application>
</manifest>
"#;

#[test]
fn test_merge_with_no_libraries_is_identity() {
    let mut primary = doc("main.xml", MAIN);
    let mut engine = MergeEngine::new();

    assert!(engine.merge(&mut primary, &[]));
    assert!(engine.report().is_empty());
    assert_eq!(write_document(&primary), MAIN);
}

#[test]
fn test_merge_is_idempotent() {
    let mut primary = doc("main.xml", MAIN);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(&mut primary, &[doc("lib1.xml", LIB)]));
    let once = write_document(&primary);

    // Merging the same library into the result changes nothing.
    let mut again = doc("main.xml", &once);
    let mut second = MergeEngine::new();
    assert!(second.merge(&mut again, &[doc("lib1.xml", LIB)]));
    assert_eq!(write_document(&again), once);

    // The second pass reports only identical-skip progress records.
    assert!(!second.report().is_empty());
    for diagnostic in second.report().diagnostics() {
        assert_eq!(diagnostic.severity, Severity::Progress);
        assert!(diagnostic.message.starts_with("Skipping identical"));
    }
}

#[test]
fn test_appends_follow_fixed_kind_order() {
    // The library declares kinds in scrambled document order.
    let lib = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <provider android:name="com.example.lib.Provider" />
        <service android:name="com.example.lib.Service" />
        <activity android:name="com.example.lib.Activity" />
        <receiver android:name="com.example.lib.Receiver" />
        <activity-alias android:name="com.example.lib.Alias" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", MAIN);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(&mut primary, &[doc("lib1.xml", lib)]));

    let merged = write_document(&primary);
    let positions: Vec<usize> = [
        "com.example.lib.Activity",
        "com.example.lib.Alias",
        "com.example.lib.Service",
        "com.example.lib.Receiver",
        "com.example.lib.Provider",
    ]
    .iter()
    .map(|name| merged.find(name).unwrap_or_else(|| panic!("{} missing", name)))
    .collect();

    for pair in positions.windows(2) {
        assert!(pair[0] < pair[1], "kind ordering violated");
    }
}

#[test]
fn test_library_input_order_groups_contributions() {
    let lib_a = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application><service android:name="com.example.a.Service" /></application>
</manifest>
"#;
    let lib_b = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application><activity android:name="com.example.b.Activity" /></application>
</manifest>
"#;

    let mut primary = doc("main.xml", MAIN);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(
        &mut primary,
        &[doc("libA.xml", lib_a), doc("libB.xml", lib_b)]
    ));

    // Library A's service lands before library B's activity even though the
    // kind order within one library would put activities first.
    let merged = write_document(&primary);
    let a = merged.find("com.example.a.Service").unwrap();
    let b = merged.find("com.example.b.Activity").unwrap();
    assert!(a < b);
    let marker_a = merged.find("<!-- from @libA.xml -->").unwrap();
    let marker_b = merged.find("<!-- from @libB.xml -->").unwrap();
    assert!(marker_a < a && a < marker_b && marker_b < b);
}

#[test]
fn test_primary_untouched_on_conflict() {
    let lib = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <activity android:name="com.example.MainActivity"
            android:theme="@style/Other" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", MAIN);
    let mut engine = MergeEngine::new();
    assert!(!engine.merge(&mut primary, &[doc("lib1.xml", lib)]));
    assert_eq!(write_document(&primary), MAIN);
}

#[test]
fn test_trivia_round_trip_on_append() {
    let lib = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <!-- First. -->
        <!-- Second. -->
        <activity-alias android:name="com.example.lib.Alias" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", MAIN);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(&mut primary, &[doc("lib1.xml", lib)]));

    // The whole comment run arrives with its interleaved whitespace intact.
    assert!(write_document(&primary).contains(
        "<!-- First. -->\n        \
         <!-- Second. -->\n        \
         <activity-alias android:name=\"com.example.lib.Alias\" />"
    ));
}

#[test]
fn test_main_sdk_and_gl_declarations_are_never_rewritten() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-sdk android:minSdkVersion="8" />
    <uses-feature android:glEsVersion="0x00020000" />
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    // One library is satisfied, the other conflicts on both counts; neither
    // may touch the main declarations.
    let quiet_lib = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-sdk android:minSdkVersion="3" />
    <uses-feature android:glEsVersion="0x00010001" />
</manifest>
"#;
    let loud_lib = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-sdk android:minSdkVersion="9" />
    <uses-feature android:glEsVersion="0x00030000" />
</manifest>
"#;

    let mut primary = doc("main.xml", main);
    let mut engine = MergeEngine::new();
    let success = engine.merge(
        &mut primary,
        &[doc("quiet.xml", quiet_lib), doc("loud.xml", loud_lib)],
    );

    assert!(!success);
    assert_eq!(engine.report().error_count(), 2);

    let merged = write_document(&primary);
    assert!(merged.contains("android:minSdkVersion=\"8\""));
    assert!(merged.contains("android:glEsVersion=\"0x00020000\""));
    assert_eq!(merged, main);
}

#[test]
fn test_required_is_the_or_of_all_effective_flags() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:name="com.example.TheApp">
        <uses-library android:name="lib.a" android:required="false" />
        <uses-library android:name="lib.b" android:required="false" />
        <uses-library android:name="lib.c" />
    </application>
</manifest>
"#;
    // a: stays false (all declarations false). b: escalates (one absent
    // required counts as true). c: attribute absent in the main manifest
    // stays absent, which already means required.
    let lib1 = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <uses-library android:name="lib.a" android:required="false" />
        <uses-library android:name="lib.b" android:required="false" />
        <uses-library android:name="lib.c" android:required="false" />
    </application>
</manifest>
"#;
    let lib2 = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <uses-library android:name="lib.b" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", main);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(&mut primary, &[doc("lib1.xml", lib1), doc("lib2.xml", lib2)]));

    let merged = write_document(&primary);
    assert!(merged.contains("<uses-library android:name=\"lib.a\" android:required=\"false\" />"));
    assert!(merged.contains("<uses-library android:name=\"lib.b\" android:required=\"true\" />"));
    assert!(merged.contains("<uses-library android:name=\"lib.c\" />"));
}

#[test]
fn test_unrecognized_library_elements_are_ignored() {
    let lib = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <supports-screens android:largeScreens="true" />
    <uses-configuration android:reqFiveWayNav="true" />
    <compatible-screens />
    <supports-gl-texture android:name="GL_OES_compressed_ETC1_RGB8_texture" />
    <application>
        <unknown-element android:name="whatever" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", MAIN);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(&mut primary, &[doc("lib1.xml", lib)]));
    assert!(engine.report().is_empty());
    assert_eq!(write_document(&primary), MAIN);
}
