fn main() {
    ocl_cli::cli::run();
}
