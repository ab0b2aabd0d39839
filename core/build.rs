fn main() {
    uniffi::generate_scaffolding("src/deco_planner.udl").unwrap();
}
